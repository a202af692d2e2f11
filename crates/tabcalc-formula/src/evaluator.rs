//! Formula evaluator
//!
//! Evaluates formula ASTs against a row context to produce values.
//! Evaluation is pure: it performs no I/O and never mutates the context.

use crate::ast::{AggregateFunction, BinaryOperator, CellReference, FormulaExpr};
use crate::error::{FormulaError, FormulaResult};
use std::collections::HashMap;
use std::fmt;
use tabcalc_core::{CellSnapshot, ColumnId, RawValue, RowId, TableId};

/// Value produced by evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    /// Undefined arithmetic outcome, e.g. division by zero
    Undefined,
}

impl FormulaValue {
    /// The number, if defined
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Undefined => None,
        }
    }

    /// Check if this is the undefined sentinel
    pub fn is_undefined(&self) -> bool {
        matches!(self, FormulaValue::Undefined)
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaValue::Number(n) => write!(f, "{}", n),
            FormulaValue::Undefined => f.write_str("undefined"),
        }
    }
}

impl From<f64> for FormulaValue {
    fn from(n: f64) -> Self {
        FormulaValue::Number(n)
    }
}

impl From<FormulaValue> for RawValue {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Number(n) => RawValue::Number(n),
            FormulaValue::Undefined => RawValue::Null,
        }
    }
}

/// Context for formula evaluation
///
/// Built fresh for every evaluation from the cells sharing one row.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    /// Table hosting the formula
    pub table_id: TableId,
    /// Row hosting the formula
    pub row_id: RowId,
    /// Sibling cells keyed by column
    pub sibling_cells: HashMap<ColumnId, CellSnapshot>,
}

impl EvaluationContext {
    /// Create a context from the cells of one row
    ///
    /// When a column appears more than once the last snapshot wins.
    pub fn new(
        table_id: impl Into<TableId>,
        row_id: impl Into<RowId>,
        cells: impl IntoIterator<Item = CellSnapshot>,
    ) -> Self {
        Self {
            table_id: table_id.into(),
            row_id: row_id.into(),
            sibling_cells: cells
                .into_iter()
                .map(|cell| (cell.column_id.clone(), cell))
                .collect(),
        }
    }

    /// Create a simple context without any cells (for testing)
    pub fn simple() -> Self {
        Self::default()
    }

    /// Numeric value of a referenced cell
    ///
    /// Missing cells, and cells outside this row, read as `0`.
    pub fn get_cell_value(&self, cell_ref: &CellReference) -> f64 {
        let table = cell_ref.table.resolve(&self.table_id);
        let row = cell_ref.row.resolve(&self.row_id);
        if table != self.table_id || row != self.row_id {
            return 0.0;
        }

        self.sibling_cells
            .get(&cell_ref.column)
            .map(|cell| cell.raw_value.as_number())
            .unwrap_or(0.0)
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Constant(n) => Ok(FormulaValue::Number(*n)),

        // === References ===
        FormulaExpr::CellRef(cell_ref) => Ok(FormulaValue::Number(ctx.get_cell_value(cell_ref))),

        // === Operators ===
        FormulaExpr::BinaryOp { op, operands } => evaluate_binary_op(*op, operands, ctx),

        FormulaExpr::Aggregate { func, operands } => evaluate_aggregate(*func, operands, ctx),

        FormulaExpr::Conditional {
            condition,
            then_branch,
            else_branch,
        } => match evaluate(condition, ctx)? {
            FormulaValue::Undefined => Ok(FormulaValue::Undefined),
            FormulaValue::Number(n) if n != 0.0 => evaluate(then_branch, ctx),
            FormulaValue::Number(_) => evaluate(else_branch, ctx),
        },
    }
}

/// Evaluate an arithmetic operation, folding operands left to right
///
/// The first undefined step ends the fold; later operands are not evaluated.
fn evaluate_binary_op(
    op: BinaryOperator,
    operands: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let (mut acc, rest) = match op {
        BinaryOperator::Add => (0.0, operands),
        BinaryOperator::Multiply => (1.0, operands),
        BinaryOperator::Subtract | BinaryOperator::Divide => {
            let (first, rest) = operands
                .split_first()
                .ok_or(FormulaError::MissingOperand(op.tag()))?;
            match evaluate(first, ctx)? {
                FormulaValue::Number(n) => (n, rest),
                FormulaValue::Undefined => return Ok(FormulaValue::Undefined),
            }
        }
    };

    for operand in rest {
        let value = match evaluate(operand, ctx)? {
            FormulaValue::Number(n) => n,
            FormulaValue::Undefined => return Ok(FormulaValue::Undefined),
        };

        acc = match op {
            BinaryOperator::Add => acc + value,
            BinaryOperator::Subtract => acc - value,
            BinaryOperator::Multiply => acc * value,
            BinaryOperator::Divide => {
                if value == 0.0 {
                    return Ok(FormulaValue::Undefined);
                }
                acc / value
            }
        };
    }

    Ok(FormulaValue::Number(acc))
}

/// Evaluate an aggregate; every operand is evaluated eagerly
fn evaluate_aggregate(
    func: AggregateFunction,
    operands: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let mut values = Vec::with_capacity(operands.len());
    for operand in operands {
        values.push(evaluate(operand, ctx)?);
    }

    let total: Option<f64> = values.iter().map(FormulaValue::as_number).sum();

    Ok(match (func, total) {
        (AggregateFunction::Count, _) => FormulaValue::Number(values.len() as f64),
        (_, None) => FormulaValue::Undefined,
        (AggregateFunction::Sum, Some(total)) => FormulaValue::Number(total),
        (AggregateFunction::Average, Some(_)) if values.is_empty() => FormulaValue::Undefined,
        (AggregateFunction::Average, Some(total)) => {
            FormulaValue::Number(total / values.len() as f64)
        }
    })
}
