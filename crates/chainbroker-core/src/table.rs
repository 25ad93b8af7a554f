//! Key-value table storage backing the contract registry.
//!
//! On chain this is a precompiled CRUD service: a table has one key field and
//! a fixed list of value fields, and several records may share a key. The
//! registry only needs three operations, so the trait stays narrow.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GasConfig;
use crate::error::TableError;

/// One record: value field name → value.
pub type Record = BTreeMap<String, String>;

/// Shape of a key-value table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub key_field: String,
    pub value_fields: Vec<String>,
}

impl TableSchema {
    pub fn new(
        name: impl Into<String>,
        key_field: impl Into<String>,
        value_fields: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            key_field: key_field.into(),
            value_fields: value_fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Comma-separated value fields, as the CRUD service describes them.
    pub fn value_fields_csv(&self) -> String {
        self.value_fields.join(",")
    }
}

/// Storage for registry tables.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Open `schema.name`, creating it with `schema` if it does not exist.
    ///
    /// Returns the schema the store actually holds, which may differ from
    /// the requested one when the table already existed.
    async fn ensure_table(&self, schema: &TableSchema) -> Result<TableSchema, TableError>;

    /// All records stored under `key`, in insertion order.
    async fn get(&self, table: &str, key: &str) -> Result<Vec<Record>, TableError>;

    /// Insert a record under `key`. Returns the number of affected rows.
    ///
    /// On chain the insert is a transaction paid with `gas`.
    async fn put(
        &self,
        table: &str,
        key: &str,
        record: Record,
        gas: &GasConfig,
    ) -> Result<usize, TableError>;
}

// ─── In-memory store ─────────────────────────────────────────────────────────

struct MemoryTable {
    schema: TableSchema,
    rows: Vec<(String, Record)>,
}

/// In-memory table store for tests and chain-less deployments.
#[derive(Default)]
pub struct MemoryTableStore {
    tables: Mutex<HashMap<String, MemoryTable>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create a table, e.g. one with a foreign layout.
    pub fn with_table(self, schema: TableSchema) -> Self {
        self.tables.lock().unwrap().insert(
            schema.name.clone(),
            MemoryTable {
                schema,
                rows: Vec::new(),
            },
        );
        self
    }

    /// Total rows across every key of `table`.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn ensure_table(&self, schema: &TableSchema) -> Result<TableSchema, TableError> {
        let mut tables = self.tables.lock().unwrap();
        let table = tables.entry(schema.name.clone()).or_insert_with(|| {
            tracing::info!(table = %schema.name, "table not found, creating it");
            MemoryTable {
                schema: schema.clone(),
                rows: Vec::new(),
            }
        });
        Ok(table.schema.clone())
    }

    async fn get(&self, table: &str, key: &str) -> Result<Vec<Record>, TableError> {
        let tables = self.tables.lock().unwrap();
        let t = tables
            .get(table)
            .ok_or_else(|| TableError::Store(format!("table '{table}' does not exist")))?;
        Ok(t.rows
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn put(
        &self,
        table: &str,
        key: &str,
        record: Record,
        _gas: &GasConfig,
    ) -> Result<usize, TableError> {
        let mut tables = self.tables.lock().unwrap();
        let t = tables
            .get_mut(table)
            .ok_or_else(|| TableError::Store(format!("table '{table}' does not exist")))?;
        if let Some(field) = record.keys().find(|f| !t.schema.value_fields.contains(f)) {
            return Err(TableError::Store(format!(
                "unknown field '{field}' in table '{table}'"
            )));
        }
        t.rows.push((key.to_string(), record));
        Ok(1)
    }
}
