//! Records produced by formula application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cell::{CellId, ColumnId, FormulaId, RawValue, RowId, TableId};

/// Type tag written alongside a cell value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    String,
    Number,
    Date,
    Formula,
}

/// A cell as stored by the result sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub table_id: TableId,
    pub row_id: RowId,
    pub column_id: ColumnId,
    pub value: RawValue,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub formula_id: Option<FormulaId>,
    pub updated_at: DateTime<Utc>,
}

impl CellRecord {
    /// Composite key of this cell
    pub fn cell_id(&self) -> CellId {
        CellId::new(
            self.table_id.clone(),
            self.row_id.clone(),
            self.column_id.clone(),
        )
    }
}

/// One applied formula, persisted by the result sink
///
/// `calculated_value` is `None` when the result was undefined
/// (e.g. division by zero).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationHistoryRecord {
    pub table_id: TableId,
    pub row_id: RowId,
    pub column_id: ColumnId,
    pub formula_id: FormulaId,
    pub formula_name: String,
    pub formula_expression: serde_json::Value,
    pub calculated_value: Option<f64>,
    pub applied_at: DateTime<Utc>,
}

impl CalculationHistoryRecord {
    /// Composite key of the target cell
    pub fn cell_id(&self) -> CellId {
        CellId::new(
            self.table_id.clone(),
            self.row_id.clone(),
            self.column_id.clone(),
        )
    }
}
