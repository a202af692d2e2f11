//! Formula document decoding
//!
//! Stored formulas are JSON documents tagged by `type`:
//!
//! ```json
//! {"type": "multiply", "operands": [
//!     {"type": "cell_reference", "table": "current", "row": "current", "column": "price"},
//!     {"type": "constant", "value": 2}
//! ]}
//! ```
//!
//! Decoding turns the document into a [`FormulaExpr`] so that unknown tags
//! fail once, up front, instead of at every evaluation.

use crate::ast::{AggregateFunction, BinaryOperator, CellReference, FormulaExpr, Scope};
use crate::error::{FormulaError, FormulaResult};
use serde_json::{json, Map, Value};
use tabcalc_core::RawValue;

/// Sentinel used for `table`/`row` fields that follow the evaluation context
pub const CURRENT: &str = "current";

/// Decode a formula document
pub fn parse_document(doc: &Value) -> FormulaResult<FormulaExpr> {
    let obj = doc
        .as_object()
        .ok_or_else(|| FormulaError::MalformedExpression(format!("expected object, got {}", doc)))?;

    let tag = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| FormulaError::MalformedExpression("missing string field 'type'".into()))?;

    match tag {
        "constant" => parse_constant(obj),
        "cell_reference" => parse_cell_reference(obj),

        "add" => parse_binary(BinaryOperator::Add, obj),
        "subtract" => parse_binary(BinaryOperator::Subtract, obj),
        "multiply" => parse_binary(BinaryOperator::Multiply, obj),
        "divide" => parse_binary(BinaryOperator::Divide, obj),

        "sum" => parse_aggregate(AggregateFunction::Sum, obj),
        "average" => parse_aggregate(AggregateFunction::Average, obj),
        "count" => parse_aggregate(AggregateFunction::Count, obj),

        "if" => Ok(FormulaExpr::conditional(
            parse_document(field(obj, "condition", tag)?)?,
            parse_document(field(obj, "then", tag)?)?,
            parse_document(field(obj, "else", tag)?)?,
        )),

        other => Err(FormulaError::UnknownExpressionType(other.to_string())),
    }
}

/// Decode a formula document from JSON text
pub fn parse_document_str(text: &str) -> FormulaResult<FormulaExpr> {
    let doc: Value = serde_json::from_str(text)
        .map_err(|e| FormulaError::MalformedExpression(format!("invalid JSON: {}", e)))?;
    parse_document(&doc)
}

/// Encode an expression back into its document form
pub fn to_document(expr: &FormulaExpr) -> Value {
    match expr {
        FormulaExpr::Constant(n) => json!({ "type": "constant", "value": n }),
        FormulaExpr::CellRef(cell_ref) => json!({
            "type": "cell_reference",
            "table": scope_to_str(&cell_ref.table),
            "row": scope_to_str(&cell_ref.row),
            "column": cell_ref.column,
        }),
        FormulaExpr::BinaryOp { op, operands } => json!({
            "type": op.tag(),
            "operands": operands.iter().map(to_document).collect::<Vec<_>>(),
        }),
        FormulaExpr::Aggregate { func, operands } => json!({
            "type": func.tag(),
            "operands": operands.iter().map(to_document).collect::<Vec<_>>(),
        }),
        FormulaExpr::Conditional {
            condition,
            then_branch,
            else_branch,
        } => json!({
            "type": "if",
            "condition": to_document(condition),
            "then": to_document(then_branch),
            "else": to_document(else_branch),
        }),
    }
}

fn field<'a>(obj: &'a Map<String, Value>, name: &str, tag: &str) -> FormulaResult<&'a Value> {
    obj.get(name).ok_or_else(|| {
        FormulaError::MalformedExpression(format!("'{}' requires field '{}'", tag, name))
    })
}

fn parse_constant(obj: &Map<String, Value>) -> FormulaResult<FormulaExpr> {
    let value = match field(obj, "value", "constant")? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => RawValue::Text(s.clone()).as_number(),
        Value::Null => 0.0,
        other => {
            return Err(FormulaError::MalformedExpression(format!(
                "constant value must be a number or string, got {}",
                other
            )))
        }
    };
    Ok(FormulaExpr::Constant(value))
}

fn parse_cell_reference(obj: &Map<String, Value>) -> FormulaResult<FormulaExpr> {
    let column = field(obj, "column", "cell_reference")?
        .as_str()
        .ok_or_else(|| {
            FormulaError::MalformedExpression("cell_reference column must be a string".into())
        })?;

    Ok(FormulaExpr::CellRef(CellReference {
        table: parse_scope(obj, "table")?,
        row: parse_scope(obj, "row")?,
        column: column.to_string(),
    }))
}

fn parse_scope(obj: &Map<String, Value>, name: &str) -> FormulaResult<Scope> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(Scope::Current),
        Some(Value::String(s)) if s == CURRENT => Ok(Scope::Current),
        Some(Value::String(s)) => Ok(Scope::Id(s.clone())),
        // Row ids are sometimes stored as bare numbers
        Some(Value::Number(n)) => Ok(Scope::Id(n.to_string())),
        Some(other) => Err(FormulaError::MalformedExpression(format!(
            "cell_reference {} must be a string, got {}",
            name, other
        ))),
    }
}

fn parse_operands(obj: &Map<String, Value>, tag: &str) -> FormulaResult<Vec<FormulaExpr>> {
    field(obj, "operands", tag)?
        .as_array()
        .ok_or_else(|| {
            FormulaError::MalformedExpression(format!("'{}' operands must be an array", tag))
        })?
        .iter()
        .map(parse_document)
        .collect()
}

fn parse_binary(op: BinaryOperator, obj: &Map<String, Value>) -> FormulaResult<FormulaExpr> {
    Ok(FormulaExpr::binary(op, parse_operands(obj, op.tag())?))
}

fn parse_aggregate(
    func: AggregateFunction,
    obj: &Map<String, Value>,
) -> FormulaResult<FormulaExpr> {
    Ok(FormulaExpr::aggregate(func, parse_operands(obj, func.tag())?))
}

fn scope_to_str(scope: &Scope) -> &str {
    match scope {
        Scope::Current => CURRENT,
        Scope::Id(id) => id,
    }
}
