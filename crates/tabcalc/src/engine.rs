//! Formula application
//!
//! [`FormulaEngine`] applies a stored formula to a target cell:
//!
//! 1. resolve the formula and table metadata
//! 2. consult the result cache
//! 3. on a miss, fetch the row context and evaluate
//! 4. write the value through the result sink and append a history record
//!
//! # Example
//!
//! ```rust,ignore
//! use tabcalc::prelude::*;
//!
//! let engine = FormulaEngine::new(store.clone(), store.clone(), store.clone());
//! let update = engine.apply_formula("line_total", "orders", "row_1", "total").await?;
//! println!("{} = {}", update.record.cell_id(), update.value);
//! ```

use chrono::Utc;
use tabcalc_core::{CalculationHistoryRecord, CellId, CellRecord, FormulaDefinition, ValueType};
use tabcalc_formula::{evaluate, parse_document, EvaluationContext, FormulaValue};

use crate::cache::{CacheKey, FormulaCache};
use crate::error::ApplyError;
use crate::options::EngineOptions;
use crate::provider::{CellWrite, FormulaLookup, ResultSink, RowContextProvider};

/// Result of applying a formula to one cell
#[derive(Debug, Clone, PartialEq)]
pub struct CellUpdate {
    /// The cell as stored by the sink
    pub record: CellRecord,
    /// The computed value
    pub value: FormulaValue,
    /// Whether the value came from the cache
    pub from_cache: bool,
    /// Whether the history record was stored
    pub history_recorded: bool,
}

/// A formula application together with the definition that produced it
pub(crate) struct Applied {
    pub update: CellUpdate,
    pub formula: FormulaDefinition,
}

/// Applies formulas to cells with cached evaluation
///
/// The engine is generic over its three collaborators and owns its cache.
/// All methods take `&self`, so one engine can serve concurrent callers.
pub struct FormulaEngine<P, L, S> {
    rows: P,
    lookup: L,
    sink: S,
    cache: FormulaCache,
    options: EngineOptions,
}

impl<P, L, S> FormulaEngine<P, L, S>
where
    P: RowContextProvider,
    L: FormulaLookup,
    S: ResultSink,
{
    /// Create an engine with default options
    pub fn new(rows: P, lookup: L, sink: S) -> Self {
        Self::with_options(rows, lookup, sink, EngineOptions::default())
    }

    /// Create an engine with custom options
    pub fn with_options(rows: P, lookup: L, sink: S, options: EngineOptions) -> Self {
        Self {
            rows,
            lookup,
            sink,
            cache: FormulaCache::new(options.cache_ttl),
            options,
        }
    }

    /// The result cache
    pub fn cache(&self) -> &FormulaCache {
        &self.cache
    }

    /// The engine options
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Apply a formula to the cell `table_id:row_id:column_id`
    ///
    /// Lookup, row-fetch and evaluation failures abort before anything is
    /// written or cached. A failed write is reported as
    /// [`ApplyError::Persistence`] and leaves the cache untouched. A failed
    /// history append is logged and reported through
    /// [`CellUpdate::history_recorded`].
    pub async fn apply_formula(
        &self,
        formula_id: &str,
        table_id: &str,
        row_id: &str,
        column_id: &str,
    ) -> Result<CellUpdate, ApplyError> {
        let cell = CellId::new(table_id, row_id, column_id);
        tracing::debug!(%cell, formula = formula_id, "applying formula");
        let use_cache = self.options.cache_enabled;
        Ok(self.apply(formula_id, &cell, use_cache).await?.update)
    }

    pub(crate) async fn apply(
        &self,
        formula_id: &str,
        cell: &CellId,
        use_cache: bool,
    ) -> Result<Applied, ApplyError> {
        let (formula, table) = tokio::join!(
            self.lookup.get_formula(formula_id),
            self.lookup.get_table(&cell.table),
        );
        let formula = formula
            .map_err(ApplyError::Lookup)?
            .ok_or_else(|| ApplyError::FormulaNotFound(formula_id.to_string()))?;
        let table = table
            .map_err(ApplyError::Lookup)?
            .ok_or_else(|| ApplyError::TableNotFound(cell.table.clone()))?;

        if table.column(&cell.column).is_none() {
            tracing::debug!(
                table = %table.id,
                column = %cell.column,
                "target column not in table schema"
            );
        }

        let key = CacheKey::new(formula_id, cell);
        let cached = if use_cache { self.cache.get(&key) } else { None };

        let (value, from_cache) = match cached {
            Some(value) => {
                tracing::debug!(%cell, formula = formula_id, "formula cache hit");
                (value, true)
            }
            None => (self.evaluate_formula(&formula, cell).await?, false),
        };

        let record = self
            .sink
            .write_cell_value(CellWrite {
                cell: cell.clone(),
                value: value.into(),
                value_type: ValueType::Number,
                formula_id: formula.id.clone(),
            })
            .await
            .map_err(|source| ApplyError::Persistence {
                cell: cell.clone(),
                source,
            })?;

        // Only a persisted value is cached
        if !from_cache && self.options.cache_enabled {
            self.cache.insert(key, value);
        }

        let history_recorded =
            self.options.record_history && self.record_history(&formula, cell, value).await;

        Ok(Applied {
            update: CellUpdate {
                record,
                value,
                from_cache,
                history_recorded,
            },
            formula,
        })
    }

    /// Fetch the row context and evaluate a formula for one cell
    ///
    /// Bypasses the cache and writes nothing.
    pub async fn evaluate_formula(
        &self,
        formula: &FormulaDefinition,
        cell: &CellId,
    ) -> Result<FormulaValue, ApplyError> {
        let expr = parse_document(&formula.expression)?;

        let cells = self
            .rows
            .fetch_row(&cell.table, &cell.row)
            .await
            .map_err(|source| ApplyError::RowContext {
                table: cell.table.clone(),
                row: cell.row.clone(),
                source,
            })?;

        let ctx = EvaluationContext::new(cell.table.clone(), cell.row.clone(), cells);
        let value = evaluate(&expr, &ctx)?;

        tracing::debug!(
            %cell,
            formula = %formula.id,
            depth = expr.depth(),
            siblings = ctx.sibling_cells.len(),
            %value,
            "formula evaluated"
        );
        Ok(value)
    }

    async fn record_history(
        &self,
        formula: &FormulaDefinition,
        cell: &CellId,
        value: FormulaValue,
    ) -> bool {
        let record = CalculationHistoryRecord {
            table_id: cell.table.clone(),
            row_id: cell.row.clone(),
            column_id: cell.column.clone(),
            formula_id: formula.id.clone(),
            formula_name: formula.name.clone(),
            formula_expression: formula.expression.clone(),
            calculated_value: value.as_number(),
            applied_at: Utc::now(),
        };

        match self.sink.append_history(record).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    %cell,
                    formula = %formula.id,
                    "failed to record calculation history: {e}"
                );
                false
            }
        }
    }
}
