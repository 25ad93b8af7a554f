//! Schema version → contract address mapping on a key-value table.

use std::collections::{BTreeMap, BTreeSet};

use chainbroker_core::{
    BrokerError, GasConfig, Record, RegistryEntry, SchemaVersion, TableError, TableSchema,
    TableStore,
};

/// Registry table name.
pub const TABLE_NAME: &str = "WeEvent";
/// Key field of the registry table.
pub const KEY_FIELD: &str = "key";
/// Value field holding the contract address.
pub const VALUE_FIELD: &str = "value";
/// Value field holding the schema version.
pub const VERSION_FIELD: &str = "version";
/// Registry key under which topic-control addresses are stored.
pub const TOPIC_CONTROL_KEY: &str = "topic_control_address";

fn table_error(op: &str, e: TableError) -> BrokerError {
    BrokerError::TransactionExecute(format!("{op} on table {TABLE_NAME}: {e}"))
}

/// Versioned registry of topic-control contract addresses.
///
/// Rows are never deleted; a new version supersedes older ones without
/// removing them. Reads and writes are not serialised across brokers: two
/// concurrent [`add_address`](Self::add_address) calls for the same version
/// may both insert.
pub struct ContractRegistry<S> {
    store: S,
    gas: GasConfig,
}

impl<S: TableStore> ContractRegistry<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            gas: GasConfig::default(),
        }
    }

    /// Gas used for registry inserts.
    pub fn with_gas(mut self, gas: GasConfig) -> Self {
        self.gas = gas;
        self
    }

    pub fn gas(&self) -> &GasConfig {
        &self.gas
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The table layout the registry expects.
    pub fn schema() -> TableSchema {
        TableSchema::new(TABLE_NAME, KEY_FIELD, &[VALUE_FIELD, VERSION_FIELD])
    }

    /// Open the registry table, creating it on first use.
    ///
    /// An existing table must have key field `key` and exactly the value
    /// fields `value` and `version`, in any order.
    pub async fn ensure_table(&self) -> Result<TableSchema, BrokerError> {
        let expected = Self::schema();
        let actual = self
            .store
            .ensure_table(&expected)
            .await
            .map_err(|e| table_error("ensure", e))?;

        if actual.key_field != expected.key_field {
            return Err(BrokerError::schema_mismatch(format!(
                "table {TABLE_NAME} has key field '{}', expected '{KEY_FIELD}'",
                actual.key_field
            )));
        }
        let fields: BTreeSet<&str> = actual.value_fields.iter().map(String::as_str).collect();
        let wanted: BTreeSet<&str> = [VALUE_FIELD, VERSION_FIELD].into_iter().collect();
        if actual.value_fields.len() != wanted.len() || fields != wanted {
            return Err(BrokerError::schema_mismatch(format!(
                "table {TABLE_NAME} has value fields '{}', expected '{VALUE_FIELD},{VERSION_FIELD}'",
                actual.value_fields_csv()
            )));
        }

        tracing::debug!(table = TABLE_NAME, "registry table ready");
        Ok(actual)
    }

    /// Every registry row in insertion order, duplicates included.
    ///
    /// Opens (and if needed creates) the table first, so the layout is
    /// checked on every read.
    pub async fn entries(&self) -> Result<Vec<RegistryEntry>, BrokerError> {
        self.ensure_table().await?;
        let rows = self
            .store
            .get(TABLE_NAME, TOPIC_CONTROL_KEY)
            .await
            .map_err(|e| table_error("select", e))?;
        rows.iter().map(parse_row).collect()
    }

    /// Every registered version and its address.
    ///
    /// If a version was registered more than once (concurrent inserts), the
    /// earliest row wins.
    pub async fn list_addresses(&self) -> Result<BTreeMap<SchemaVersion, String>, BrokerError> {
        let mut addresses = BTreeMap::new();
        for entry in self.entries().await? {
            addresses.entry(entry.version).or_insert(entry.address);
        }
        tracing::debug!(versions = addresses.len(), "listed registry addresses");
        Ok(addresses)
    }

    /// Register `address` for `version` unless the version is already known.
    ///
    /// Returns `Ok(false)` when the version exists or the insert did not go
    /// through; insert failures are logged, not returned. Errors reading the
    /// current listing are returned.
    pub async fn add_address(
        &self,
        version: SchemaVersion,
        address: &str,
    ) -> Result<bool, BrokerError> {
        let existing = self.list_addresses().await?;
        if let Some(current) = existing.get(&version) {
            tracing::info!(%version, %current, "version already registered, skipping insert");
            return Ok(false);
        }

        let mut record = Record::new();
        record.insert(VALUE_FIELD.to_string(), address.to_string());
        record.insert(VERSION_FIELD.to_string(), version.to_string());

        match self.store.put(TABLE_NAME, TOPIC_CONTROL_KEY, record, &self.gas).await {
            Ok(1) => {
                tracing::info!(%version, address, "registered topic-control address");
                Ok(true)
            }
            Ok(affected) => {
                tracing::warn!(%version, address, affected, "unexpected insert result");
                Ok(false)
            }
            Err(e) => {
                tracing::error!(%version, address, error = %e, "registry insert failed");
                Ok(false)
            }
        }
    }
}

fn parse_row(row: &Record) -> Result<RegistryEntry, BrokerError> {
    let version = row
        .get(VERSION_FIELD)
        .ok_or_else(|| BrokerError::schema_mismatch("registry row has no version field"))?
        .parse::<SchemaVersion>()?;
    let address = row
        .get(VALUE_FIELD)
        .ok_or_else(|| BrokerError::schema_mismatch("registry row has no value field"))?;
    Ok(RegistryEntry {
        version,
        address: address.clone(),
    })
}
