//! Collaborator interfaces
//!
//! The engine owns no storage. Row contents, formula and table metadata, and
//! the destination for computed values are all supplied by the host through
//! these traits.

use async_trait::async_trait;
use std::sync::Arc;
use tabcalc_core::{
    CalculationHistoryRecord, CellId, CellRecord, CellSnapshot, FormulaDefinition, FormulaId,
    RawValue, TableSchema, ValueType,
};

/// Error returned by a collaborator
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Supplies the cells of one row
#[async_trait]
pub trait RowContextProvider: Send + Sync {
    /// Every cell sharing `(table_id, row_id)`
    ///
    /// A column with no cell is simply absent from the result.
    async fn fetch_row(
        &self,
        table_id: &str,
        row_id: &str,
    ) -> Result<Vec<CellSnapshot>, CollaboratorError>;
}

/// Resolves formula and table metadata
#[async_trait]
pub trait FormulaLookup: Send + Sync {
    /// `Ok(None)` when no formula has this id
    async fn get_formula(
        &self,
        formula_id: &str,
    ) -> Result<Option<FormulaDefinition>, CollaboratorError>;

    /// `Ok(None)` when no table has this id
    async fn get_table(&self, table_id: &str) -> Result<Option<TableSchema>, CollaboratorError>;
}

/// A computed value to store
#[derive(Debug, Clone, PartialEq)]
pub struct CellWrite {
    pub cell: CellId,
    pub value: RawValue,
    pub value_type: ValueType,
    pub formula_id: FormulaId,
}

/// Destination for computed values
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Upsert the target cell
    async fn write_cell_value(&self, write: CellWrite) -> Result<CellRecord, CollaboratorError>;

    /// Persist one calculation history record
    async fn append_history(
        &self,
        record: CalculationHistoryRecord,
    ) -> Result<(), CollaboratorError>;
}

#[async_trait]
impl<T: RowContextProvider + ?Sized> RowContextProvider for Arc<T> {
    async fn fetch_row(
        &self,
        table_id: &str,
        row_id: &str,
    ) -> Result<Vec<CellSnapshot>, CollaboratorError> {
        (**self).fetch_row(table_id, row_id).await
    }
}

#[async_trait]
impl<T: FormulaLookup + ?Sized> FormulaLookup for Arc<T> {
    async fn get_formula(
        &self,
        formula_id: &str,
    ) -> Result<Option<FormulaDefinition>, CollaboratorError> {
        (**self).get_formula(formula_id).await
    }

    async fn get_table(&self, table_id: &str) -> Result<Option<TableSchema>, CollaboratorError> {
        (**self).get_table(table_id).await
    }
}

#[async_trait]
impl<T: ResultSink + ?Sized> ResultSink for Arc<T> {
    async fn write_cell_value(&self, write: CellWrite) -> Result<CellRecord, CollaboratorError> {
        (**self).write_cell_value(write).await
    }

    async fn append_history(
        &self,
        record: CalculationHistoryRecord,
    ) -> Result<(), CollaboratorError> {
        (**self).append_history(record).await
    }
}
