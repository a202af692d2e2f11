//! Composite cell key

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ColumnId, RowId, TableId};

/// Unique key for a cell (table + row + column)
///
/// The text form is `table:row:column`. Table and row ids may not contain
/// `:`; the column id takes whatever follows the second separator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellId {
    pub table: TableId,
    pub row: RowId,
    pub column: ColumnId,
}

impl CellId {
    /// Create a new cell id
    pub fn new(
        table: impl Into<TableId>,
        row: impl Into<RowId>,
        column: impl Into<ColumnId>,
    ) -> Self {
        Self {
            table: table.into(),
            row: row.into(),
            column: column.into(),
        }
    }

    /// Parse a cell id from its `table:row:column` form
    ///
    /// # Examples
    /// ```
    /// use tabcalc_core::CellId;
    ///
    /// let id = CellId::parse("orders:row_1:total").unwrap();
    /// assert_eq!(id.table, "orders");
    /// assert_eq!(id.row, "row_1");
    /// assert_eq!(id.column, "total");
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let table = parts.next().unwrap_or_default();
        let row = parts.next().unwrap_or_default();
        let column = parts.next().unwrap_or_default();

        if table.is_empty() || row.is_empty() || column.is_empty() {
            return Err(Error::InvalidCellId(format!(
                "expected 'table:row:column', got '{}'",
                s
            )));
        }

        Ok(Self::new(table, row, column))
    }

    /// Whether this cell lives in the given row
    pub fn is_in_row(&self, table: &str, row: &str) -> bool {
        self.table == table && self.row == row
    }

    /// A sibling cell in the same row
    pub fn sibling(&self, column: impl Into<ColumnId>) -> Self {
        Self::new(self.table.clone(), self.row.clone(), column)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.table, self.row, self.column)
    }
}

impl FromStr for CellId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CellId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<CellId> for String {
    fn from(id: CellId) -> Self {
        id.to_string()
    }
}
