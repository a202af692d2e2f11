//! # tabcalc
//!
//! Formula application engine for tabular data.
//!
//! Cells of a table row hold either literal values or the result of a
//! formula that reads sibling cells. This crate applies stored formulas to
//! target cells and keeps formula cells up to date when their inputs change.
//!
//! ## Features
//!
//! - JSON formula documents decoded into a closed expression type
//! - Spreadsheet-style evaluation: missing cells read as `0`, division by zero is undefined
//! - Time-bounded result cache owned by each engine
//! - Cell dependency graph with cycle detection and topological recalculation
//! - Async collaborator traits for row context, metadata lookup and result storage
//!
//! ## Example
//!
//! ```rust,ignore
//! use tabcalc::prelude::*;
//!
//! // `store` implements RowContextProvider, FormulaLookup and ResultSink
//! let engine = FormulaEngine::new(store.clone(), store.clone(), store.clone());
//!
//! let update = engine
//!     .apply_formula("line_total", "orders", "row_1", "total")
//!     .await?;
//! assert_eq!(update.value, FormulaValue::Number(2400.0));
//! ```

pub mod cache;
pub mod calculation;
pub mod engine;
pub mod error;
pub mod options;
pub mod prelude;
pub mod provider;

pub use cache::{CacheEntry, CacheKey, CacheStats, FormulaCache};
pub use calculation::{CalculationStats, FormulaBindings};
pub use engine::{CellUpdate, FormulaEngine};
pub use error::{ApplyError, RecalcError};
pub use options::{EngineOptions, DEFAULT_CACHE_TTL};
pub use provider::{CellWrite, CollaboratorError, FormulaLookup, ResultSink, RowContextProvider};

// Re-export core types
pub use tabcalc_core::{
    CalculationHistoryRecord, CellId, CellRecord, CellSnapshot, ColumnDef, ColumnId, ColumnType,
    FormulaDefinition, FormulaId, RawValue, RowId, TableId, TableSchema, ValueType,
};

// Re-export formula types
pub use tabcalc_formula::{
    evaluate, parse_document, to_document, AggregateFunction, BinaryOperator, CellReference,
    DependencyGraph, EvaluationContext, FormulaError, FormulaExpr, FormulaResult, FormulaValue,
    Scope,
};

/// Evaluate an expression against a row context
///
/// Pure and synchronous; the same operation the engine runs on a cache miss.
pub fn evaluate_expression(
    expr: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    evaluate(expr, ctx)
}
