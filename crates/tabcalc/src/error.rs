//! Engine error types

use crate::provider::CollaboratorError;
use tabcalc_core::{CellId, FormulaId, RowId, TableId};
use tabcalc_formula::FormulaError;
use thiserror::Error;

/// Errors from [`FormulaEngine::apply_formula`](crate::FormulaEngine::apply_formula)
///
/// Everything except [`ApplyError::Persistence`] happens before any write,
/// so a failed call leaves the sink and the cache untouched.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// No formula with this id
    #[error("Formula not found: {0}")]
    FormulaNotFound(FormulaId),

    /// No table with this id
    #[error("Table not found: {0}")]
    TableNotFound(TableId),

    /// The metadata lookup itself failed
    #[error("Metadata lookup failed: {0}")]
    Lookup(#[source] CollaboratorError),

    /// The row context could not be fetched
    #[error("Failed to fetch row {table}:{row}: {source}")]
    RowContext {
        table: TableId,
        row: RowId,
        #[source]
        source: CollaboratorError,
    },

    /// The formula document is malformed or could not be evaluated
    #[error(transparent)]
    Evaluation(#[from] FormulaError),

    /// The computed value could not be written
    #[error("Failed to write cell {cell}: {source}")]
    Persistence {
        cell: CellId,
        #[source]
        source: CollaboratorError,
    },
}

impl ApplyError {
    /// Whether only the write failed, so a retry can target the sink
    pub fn is_persistence(&self) -> bool {
        matches!(self, ApplyError::Persistence { .. })
    }

    /// Whether the formula or table is missing
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApplyError::FormulaNotFound(_) | ApplyError::TableNotFound(_)
        )
    }
}

/// Errors from [`FormulaEngine::recalculate`](crate::FormulaEngine::recalculate)
#[derive(Debug, Error)]
pub enum RecalcError {
    /// No valid order exists; nothing was applied
    #[error("Cannot order recalculation: {0}")]
    Ordering(#[source] FormulaError),

    /// A cell failed after earlier cells in the order were written
    #[error("Recalculation of {cell} failed: {source}")]
    Apply {
        cell: CellId,
        #[source]
        source: ApplyError,
    },
}
