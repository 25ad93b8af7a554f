//! Error types for the broker core.

use thiserror::Error;

/// Errors surfaced by the registry, deployer, scanner and explorer.
///
/// Raw transport failures never leak past a component boundary; they are
/// re-raised as one of these kinds.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The registry table or one of its rows does not have the expected shape.
    #[error("Registry schema mismatch: {reason}")]
    SchemaMismatch { reason: String },

    /// Reading, writing or creating the registry table failed.
    #[error("Transaction execute error: {0}")]
    TransactionExecute(String),

    #[error("Deploy contract error ({role}): {reason}")]
    DeployContract { role: String, reason: String },

    #[error("Load contract error ({role}): {reason}")]
    LoadContract { role: String, reason: String },

    /// A non-transient RPC failure. Needs operator attention.
    #[error("Web3 RPC error: {0}")]
    Web3Rpc(String),

    #[error("Get block height error: {0}")]
    GetBlockHeight(String),

    /// The node is unreachable or runs an incompatible version.
    #[error("Node init error: {0}")]
    NodeInit(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BrokerError {
    pub fn schema_mismatch(reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error came from the registry table shape.
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::SchemaMismatch { .. })
    }
}

/// Errors returned by a [`ChainClient`](crate::client::ChainClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The call did not complete within the configured timeout.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The node answered with a `null` result where a value was required.
    #[error("Empty response from {method}")]
    EmptyResponse { method: String },

    /// Connection refused, HTTP failure, all nodes down, etc.
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The result could not be interpreted.
    #[error("Malformed response from {method}: {reason}")]
    Malformed { method: String, reason: String },
}

impl ClientError {
    /// Transient conditions a polling loop is expected to hit: a timeout or
    /// a mid-flight `null` from the node.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::EmptyResponse { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Errors from a registry [`TableStore`](crate::table::TableStore).
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Table store error: {0}")]
    Store(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}
