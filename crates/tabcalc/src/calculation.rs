//! Change propagation
//!
//! When a cell changes, every formula cell that transitively reads it must be
//! recomputed, dependencies first. The host owns the [`DependencyGraph`] and
//! the [`FormulaBindings`] (which formula drives which cell); the engine
//! orders the work and re-applies each bound formula.
//!
//! # Example
//!
//! ```rust,ignore
//! use tabcalc::prelude::*;
//!
//! let mut graph = DependencyGraph::new();
//! let mut bindings = FormulaBindings::new();
//! engine.bind_formula(&mut graph, &mut bindings, "line_total", &total_cell).await?;
//!
//! // ... the price cell is edited ...
//! let stats = engine.recalculate(&graph, &price_cell, &bindings).await?;
//! println!("Recalculated {} cells", stats.cells_calculated);
//! ```

use std::collections::{BTreeSet, HashMap};
use tabcalc_core::{CellId, FormulaId};
use tabcalc_formula::{parse_document, DependencyGraph};

use crate::engine::{CellUpdate, FormulaEngine};
use crate::error::{ApplyError, RecalcError};
use crate::provider::{FormulaLookup, ResultSink, RowContextProvider};

/// Which formula drives which cell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormulaBindings {
    bindings: HashMap<CellId, FormulaId>,
}

impl FormulaBindings {
    /// Create an empty set of bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a formula to a cell, returning the previous binding
    pub fn bind(&mut self, cell: CellId, formula_id: impl Into<FormulaId>) -> Option<FormulaId> {
        self.bindings.insert(cell, formula_id.into())
    }

    /// Remove the binding of a cell
    pub fn unbind(&mut self, cell: &CellId) -> Option<FormulaId> {
        self.bindings.remove(cell)
    }

    /// Formula bound to a cell
    pub fn get(&self, cell: &CellId) -> Option<&FormulaId> {
        self.bindings.get(cell)
    }

    /// Cells bound to a formula
    pub fn cells_for<'a>(&'a self, formula_id: &'a str) -> impl Iterator<Item = &'a CellId> + 'a {
        self.bindings
            .iter()
            .filter(move |(_, f)| f.as_str() == formula_id)
            .map(|(cell, _)| cell)
    }

    /// Number of bound cells
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if nothing is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Statistics from a recalculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Cells transitively affected by the change
    pub affected: usize,
    /// Number of cells recalculated
    pub cells_calculated: usize,
    /// Affected cells with no bound formula
    pub skipped: usize,
    /// Recalculated cells whose result was undefined
    pub undefined: usize,
    /// Cells written, in order
    pub order: Vec<CellId>,
}

impl<P, L, S> FormulaEngine<P, L, S>
where
    P: RowContextProvider,
    L: FormulaLookup,
    S: ResultSink,
{
    /// Apply a formula to a cell and register what it reads
    ///
    /// On success the cell is bound to the formula and its dependencies in
    /// `graph` are replaced by the formula's references. On failure neither
    /// `graph` nor `bindings` change.
    pub async fn bind_formula(
        &self,
        graph: &mut DependencyGraph,
        bindings: &mut FormulaBindings,
        formula_id: &str,
        cell: &CellId,
    ) -> Result<CellUpdate, ApplyError> {
        let applied = self.apply(formula_id, cell, self.options().cache_enabled).await?;
        let expr = parse_document(&applied.formula.expression)?;

        graph.track_formula(cell, &expr);
        bindings.bind(cell.clone(), formula_id);
        Ok(applied.update)
    }

    /// Recompute every bound cell affected by a change to `changed`
    ///
    /// Cells are written in calculation order, bypassing the cache, so each
    /// one sees the values written before it. A cycle among the affected
    /// cells fails with [`RecalcError::Ordering`] before any write. A failed
    /// cell stops the run; cells already written stay written.
    pub async fn recalculate(
        &self,
        graph: &DependencyGraph,
        changed: &CellId,
        bindings: &FormulaBindings,
    ) -> Result<CalculationStats, RecalcError> {
        let affected = graph.affected_cells(changed);
        let mut stats = CalculationStats {
            affected: affected.len(),
            ..Default::default()
        };

        if affected.is_empty() {
            return Ok(stats);
        }

        tracing::debug!(%changed, affected = affected.len(), "recalculating");
        let order = graph
            .calculation_order(&affected)
            .map_err(RecalcError::Ordering)?;

        // Cached values for these rows were computed from stale inputs
        let mut rows: BTreeSet<(&str, &str)> = BTreeSet::new();
        rows.insert((changed.table.as_str(), changed.row.as_str()));
        rows.extend(affected.iter().map(|c| (c.table.as_str(), c.row.as_str())));
        for (table, row) in rows {
            self.cache().invalidate_row(table, row);
        }

        let affected: BTreeSet<&CellId> = affected.iter().collect();
        for cell in order.iter().filter(|c| affected.contains(c)) {
            let Some(formula_id) = bindings.get(cell) else {
                stats.skipped += 1;
                continue;
            };

            let applied = self
                .apply(formula_id, cell, false)
                .await
                .map_err(|source| RecalcError::Apply {
                    cell: cell.clone(),
                    source,
                })?;

            tracing::debug!(%cell, value = %applied.update.value, "recalculated");
            if applied.update.value.is_undefined() {
                stats.undefined += 1;
            }
            stats.cells_calculated += 1;
            stats.order.push(cell.clone());
        }

        Ok(stats)
    }
}
