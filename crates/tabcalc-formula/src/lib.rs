//! # tabcalc-formula
//!
//! Formula evaluator and dependency graph for tabcalc.
//!
//! This crate provides:
//! - Formula document decoding (JSON → AST)
//! - Formula evaluation (AST + row context → value)
//! - Dependency tracking with cycle detection and recalculation ordering
//!
//! Nothing here performs I/O; the async orchestration lives in `tabcalc`.
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use tabcalc_core::CellSnapshot;
//! use tabcalc_formula::{evaluate, parse_document, EvaluationContext, FormulaValue};
//!
//! let ast = parse_document(&json!({
//!     "type": "multiply",
//!     "operands": [
//!         {"type": "cell_reference", "column": "price"},
//!         {"type": "constant", "value": 2}
//!     ]
//! }))
//! .unwrap();
//!
//! let ctx = EvaluationContext::new("orders", "row_1", vec![CellSnapshot::new("price", 10.0)]);
//! assert_eq!(evaluate(&ast, &ctx).unwrap(), FormulaValue::Number(20.0));
//! ```

pub mod ast;
pub mod dependency;
pub mod document;
pub mod error;
pub mod evaluator;

pub use ast::{AggregateFunction, BinaryOperator, CellReference, FormulaExpr, Scope};
pub use dependency::DependencyGraph;
pub use document::{parse_document, parse_document_str, to_document};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, EvaluationContext, FormulaValue};
