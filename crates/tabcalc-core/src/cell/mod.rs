//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellId`] - A cell's composite key (`table:row:column`)
//! - [`RawValue`] - The raw value stored in a cell
//! - [`CellSnapshot`] - An immutable read view of one sibling cell

mod id;
mod value;

pub use id::CellId;
pub use value::{CellSnapshot, RawValue};

/// Identifier of a table
pub type TableId = String;

/// Identifier of a row within a table
pub type RowId = String;

/// Identifier of a column within a table
pub type ColumnId = String;

/// Identifier of a stored formula
pub type FormulaId = String;
