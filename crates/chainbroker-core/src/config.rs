//! Broker configuration.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::BrokerError;
use crate::logging::LogConfig;
use crate::types::{KnownContracts, SchemaVersion};

/// Gas settings for contract deployment and registry writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasConfig {
    #[serde(default = "default_gas")]
    pub gas_price: u64,
    #[serde(default = "default_gas")]
    pub gas_limit: u64,
}

fn default_gas() -> u64 { 30_000_000 }

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            gas_price: default_gas(),
            gas_limit: default_gas(),
        }
    }
}

/// Transport-level retry of transient failures (connection errors only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_retries() -> u32 { 2 }
fn default_initial_backoff_ms() -> u64 { 100 }
fn default_max_backoff_ms() -> u64 { 2_000 }

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Top-level broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Chain group the broker is bound to.
    #[serde(default = "default_group_id")]
    pub group_id: u32,
    /// JSON-RPC endpoints of the group's nodes; tried round-robin.
    #[serde(default = "default_nodes")]
    pub nodes: Vec<String>,
    /// Upper bound for every chain call, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Receipt fetches in flight per scanned block (1 = sequential).
    #[serde(default = "default_receipt_concurrency")]
    pub receipt_concurrency: usize,
    /// The node's client version must contain this string.
    #[serde(default = "default_node_version_prefix")]
    pub node_version_prefix: String,
    /// Signing account used for deployments and registry writes.
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub gas: GasConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    /// Statically known topic-control contracts (address → version) for
    /// read-only scanning without a registry lookup.
    #[serde(default)]
    pub contracts: HashMap<String, SchemaVersion>,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_group_id() -> u32 { 1 }
fn default_nodes() -> Vec<String> { vec!["http://127.0.0.1:8545".into()] }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_receipt_concurrency() -> usize { 1 }
fn default_node_version_prefix() -> String { "2.".into() }

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            group_id: default_group_id(),
            nodes: default_nodes(),
            timeout_ms: default_timeout_ms(),
            receipt_concurrency: default_receipt_concurrency(),
            node_version_prefix: default_node_version_prefix(),
            account: None,
            gas: GasConfig::default(),
            retry: RetrySettings::default(),
            contracts: HashMap::new(),
            log: LogConfig::default(),
        }
    }
}

impl BrokerConfig {
    /// Load from a YAML or JSON file (chosen by extension) and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BrokerError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BrokerError::Config(format!("read {}: {e}", path.display())))?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&raw)?,
            _ => Self::from_yaml(&raw)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, BrokerError> {
        serde_yaml::from_str(raw).map_err(|e| BrokerError::Config(e.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, BrokerError> {
        serde_json::from_str(raw).map_err(|e| BrokerError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), BrokerError> {
        if self.nodes.iter().all(|n| n.trim().is_empty()) {
            return Err(BrokerError::Config("at least one node endpoint is required".into()));
        }
        if self.timeout_ms == 0 {
            return Err(BrokerError::Config("timeout_ms must be positive".into()));
        }
        if self.receipt_concurrency == 0 {
            return Err(BrokerError::Config("receipt_concurrency must be positive".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn known_contracts(&self) -> KnownContracts {
        self.contracts.iter().map(|(a, v)| (a.as_str(), *v)).collect()
    }
}
