//! # tabcalc-core
//!
//! Core data structures for the tabcalc formula engine.
//!
//! This crate provides the fundamental types used throughout tabcalc:
//! - [`CellId`] - The `table:row:column` key used by the dependency graph
//! - [`CellSnapshot`] and [`RawValue`] - Read-only views of sibling cells
//! - [`FormulaDefinition`] and [`TableSchema`] - Metadata from the lookup collaborator
//! - [`CellRecord`] and [`CalculationHistoryRecord`] - What a formula application writes
//!
//! ## Example
//!
//! ```rust
//! use tabcalc_core::{CellId, CellSnapshot};
//!
//! let id = CellId::parse("orders:row_1:total").unwrap();
//! assert_eq!(id.column, "total");
//!
//! let price = CellSnapshot::new("price", "1200");
//! assert_eq!(price.raw_value.as_number(), 1200.0);
//! ```

pub mod cell;
pub mod error;
pub mod record;
pub mod schema;

// Re-exports for convenience
pub use cell::{CellId, CellSnapshot, ColumnId, FormulaId, RawValue, RowId, TableId};
pub use error::{Error, Result};
pub use record::{CalculationHistoryRecord, CellRecord, ValueType};
pub use schema::{ColumnDef, ColumnType, FormulaDefinition, TableSchema};
