//! Transport-level error types.

use chainbroker_core::ClientError;
use thiserror::Error;

use crate::request::JsonRpcError;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, non-2xx status, broken body, etc.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC protocol-level error returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Every node in the pool failed.
    #[error("All nodes unavailable")]
    AllNodesDown,

    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` for transient failures worth another attempt or node.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout { .. })
    }
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout { ms } => ClientError::Timeout { ms },
            TransportError::Rpc(err) => ClientError::Rpc {
                code: err.code,
                message: err.message,
            },
            other => ClientError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(TransportError::Http("503".into()).is_retryable());
        assert!(TransportError::Timeout { ms: 5 }.is_retryable());
        assert!(!TransportError::AllNodesDown.is_retryable());
    }

    #[test]
    fn maps_into_client_error() {
        let timeout: ClientError = TransportError::Timeout { ms: 50 }.into();
        assert!(timeout.is_timeout());

        let rpc: ClientError = TransportError::Rpc(JsonRpcError {
            code: -32000,
            message: "group not exist".into(),
            data: None,
        })
        .into();
        assert!(matches!(rpc, ClientError::Rpc { code: -32000, .. }));

        let down: ClientError = TransportError::AllNodesDown.into();
        assert!(matches!(down, ClientError::Transport(_)));
    }
}
