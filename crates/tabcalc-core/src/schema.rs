//! Formula and table metadata supplied by the lookup collaborator

use serde::{Deserialize, Serialize};

use crate::cell::{ColumnId, FormulaId, TableId};

/// A named, reusable formula
///
/// `expression` is the stored JSON formula document; it is decoded into an
/// AST by `tabcalc-formula` at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaDefinition {
    pub id: FormulaId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub expression: serde_json::Value,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default)]
    pub is_template: bool,
}

impl FormulaDefinition {
    /// Create a formula definition from an expression document
    pub fn new(
        id: impl Into<FormulaId>,
        name: impl Into<String>,
        expression: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            expression,
            parameters: Vec::new(),
            is_template: false,
        }
    }
}

/// Declared type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    String,
    Number,
    Date,
    Formula,
}

/// Column definition within a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub id: ColumnId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    /// Formula bound to every cell in this column, if any
    #[serde(default)]
    pub formula: Option<FormulaId>,
}

/// Table metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub id: TableId,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// Create an empty table schema
    pub fn new(id: impl Into<TableId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Add a column (builder style)
    pub fn with_column(mut self, id: impl Into<ColumnId>, column_type: ColumnType) -> Self {
        let id = id.into();
        self.columns.push(ColumnDef {
            name: id.clone(),
            id,
            column_type,
            formula: None,
        });
        self
    }

    /// Look up a column by id
    pub fn column(&self, id: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.id == id)
    }
}
