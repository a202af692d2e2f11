//! Formula error types

use tabcalc_core::CellId;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula decoding, evaluation or ordering
///
/// Division by zero and references to missing cells are not errors; they
/// evaluate to [`FormulaValue::Undefined`](crate::FormulaValue::Undefined)
/// and `0` respectively.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula document carries a `type` tag the evaluator does not know
    #[error("Unknown expression type: {0}")]
    UnknownExpressionType(String),

    /// Formula document is not shaped like an expression
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    /// Operator needs at least one operand
    #[error("Missing operand for {0}")]
    MissingOperand(&'static str),

    /// Cell revisited while still being ordered
    #[error("Circular dependency detected involving cell {0}")]
    CircularDependency(CellId),
}
