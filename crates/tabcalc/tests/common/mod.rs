//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tabcalc::prelude::*;
use tabcalc::{CalculationHistoryRecord, CellRecord, CellWrite, ColumnType, ValueType};

pub type TestEngine = FormulaEngine<Arc<MemoryStore>, Arc<MemoryStore>, Arc<MemoryStore>>;

pub const TABLE: &str = "orders";

/// Table rows, metadata and history held in memory, with call counters
#[derive(Default)]
pub struct MemoryStore {
    formulas: Mutex<HashMap<String, FormulaDefinition>>,
    tables: Mutex<HashMap<String, TableSchema>>,
    cells: Mutex<HashMap<CellId, CellRecord>>,
    history: Mutex<Vec<CalculationHistoryRecord>>,

    pub row_fetches: AtomicUsize,
    pub writes: AtomicUsize,
    pub fail_rows: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_history: AtomicBool,
    /// Yield once inside `fetch_row` so concurrent callers interleave
    pub yield_rows: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store with the `orders` table, two rows and the standard formulas
    pub fn seeded() -> Arc<Self> {
        let store = Self::new();
        store.add_table(
            TableSchema::new(TABLE, "Orders")
                .with_column("item", ColumnType::String)
                .with_column("price", ColumnType::Number)
                .with_column("qty", ColumnType::Number)
                .with_column("total", ColumnType::Formula)
                .with_column("tax", ColumnType::Formula)
                .with_column("grand", ColumnType::Formula),
        );

        store.set_value(TABLE, "row_1", "item", "widget");
        store.set_value(TABLE, "row_1", "price", 1200.0);
        store.set_value(TABLE, "row_1", "qty", "2");
        store.set_value(TABLE, "row_2", "price", 50.0);
        store.set_value(TABLE, "row_2", "qty", 0.0);

        store.add_formula("line_total", "Line total", product("price", "qty"));
        store.add_formula(
            "tax",
            "Tax",
            json!({"type": "divide", "operands": [col("total"), constant(10.0)]}),
        );
        store.add_formula(
            "grand",
            "Grand total",
            json!({"type": "add", "operands": [col("total"), col("tax")]}),
        );
        store.add_formula(
            "unit_share",
            "Unit share",
            json!({"type": "divide", "operands": [col("price"), col("qty")]}),
        );
        store.add_formula(
            "broken",
            "Broken",
            json!({"type": "power", "operands": [col("price"), constant(2.0)]}),
        );
        store
    }

    pub fn add_table(&self, table: TableSchema) {
        self.tables.lock().insert(table.id.clone(), table);
    }

    pub fn add_formula(&self, id: &str, name: &str, expression: Value) {
        self.formulas
            .lock()
            .insert(id.to_string(), FormulaDefinition::new(id, name, expression));
    }

    /// Host-side edit of a literal cell
    pub fn set_value(&self, table: &str, row: &str, column: &str, value: impl Into<RawValue>) {
        let value = value.into();
        let value_type = match value {
            RawValue::Number(_) => ValueType::Number,
            _ => ValueType::String,
        };
        let record = CellRecord {
            table_id: table.to_string(),
            row_id: row.to_string(),
            column_id: column.to_string(),
            value,
            value_type,
            formula_id: None,
            updated_at: Utc::now(),
        };
        self.cells.lock().insert(record.cell_id(), record);
    }

    pub fn cell(&self, table: &str, row: &str, column: &str) -> Option<CellRecord> {
        self.cells
            .lock()
            .get(&CellId::new(table, row, column))
            .cloned()
    }

    pub fn value(&self, row: &str, column: &str) -> RawValue {
        self.cell(TABLE, row, column)
            .map(|c| c.value)
            .unwrap_or_default()
    }

    pub fn history(&self) -> Vec<CalculationHistoryRecord> {
        self.history.lock().clone()
    }

    pub fn row_fetches(&self) -> usize {
        self.row_fetches.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RowContextProvider for MemoryStore {
    async fn fetch_row(
        &self,
        table_id: &str,
        row_id: &str,
    ) -> Result<Vec<CellSnapshot>, CollaboratorError> {
        self.row_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_rows.load(Ordering::SeqCst) {
            return Err("row store unavailable".into());
        }
        if self.yield_rows.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }

        let mut cells: Vec<CellSnapshot> = self
            .cells
            .lock()
            .values()
            .filter(|c| c.table_id == table_id && c.row_id == row_id)
            .map(|c| CellSnapshot::new(c.column_id.clone(), c.value.clone()))
            .collect();
        cells.sort_by(|a, b| a.column_id.cmp(&b.column_id));
        Ok(cells)
    }
}

#[async_trait]
impl FormulaLookup for MemoryStore {
    async fn get_formula(
        &self,
        formula_id: &str,
    ) -> Result<Option<FormulaDefinition>, CollaboratorError> {
        Ok(self.formulas.lock().get(formula_id).cloned())
    }

    async fn get_table(&self, table_id: &str) -> Result<Option<TableSchema>, CollaboratorError> {
        Ok(self.tables.lock().get(table_id).cloned())
    }
}

#[async_trait]
impl ResultSink for MemoryStore {
    async fn write_cell_value(&self, write: CellWrite) -> Result<CellRecord, CollaboratorError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err("cell store unavailable".into());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);

        let record = CellRecord {
            table_id: write.cell.table.clone(),
            row_id: write.cell.row.clone(),
            column_id: write.cell.column.clone(),
            value: write.value,
            value_type: write.value_type,
            formula_id: Some(write.formula_id),
            updated_at: Utc::now(),
        };
        self.cells.lock().insert(write.cell, record.clone());
        Ok(record)
    }

    async fn append_history(
        &self,
        record: CalculationHistoryRecord,
    ) -> Result<(), CollaboratorError> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err("history store unavailable".into());
        }
        self.history.lock().push(record);
        Ok(())
    }
}

pub fn engine(store: &Arc<MemoryStore>) -> TestEngine {
    engine_with(store, EngineOptions::default())
}

pub fn engine_with(store: &Arc<MemoryStore>, options: EngineOptions) -> TestEngine {
    FormulaEngine::with_options(store.clone(), store.clone(), store.clone(), options)
}

pub fn cell(row: &str, column: &str) -> CellId {
    CellId::new(TABLE, row, column)
}

pub fn col(column: &str) -> Value {
    json!({"type": "cell_reference", "table": "current", "row": "current", "column": column})
}

pub fn constant(value: f64) -> Value {
    json!({"type": "constant", "value": value})
}

pub fn product(a: &str, b: &str) -> Value {
    json!({"type": "multiply", "operands": [col(a), col(b)]})
}
