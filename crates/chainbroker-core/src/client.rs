//! The `ChainClient` trait: the broker's view of a chain node.

use async_trait::async_trait;

use crate::error::ClientError;
use crate::types::{ChainBlock, Transaction, TransactionCount, TransactionReceipt};

/// Read-only RPC capability against one chain group.
///
/// Every call is bounded by the implementation's configured timeout and
/// fails independently with [`ClientError::Timeout`] or a transport error.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current head block number.
    async fn block_number(&self) -> Result<u64, ClientError>;

    /// Fetch a block; `full_transactions = false` returns hashes only.
    async fn block_by_number(
        &self,
        number: u64,
        full_transactions: bool,
    ) -> Result<ChainBlock, ClientError>;

    async fn block_by_hash(
        &self,
        hash: &str,
        full_transactions: bool,
    ) -> Result<ChainBlock, ClientError>;

    /// `Ok(None)` when the node has no receipt for `hash` (yet).
    async fn transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionReceipt>, ClientError>;

    async fn transaction_by_hash(&self, hash: &str) -> Result<Option<Transaction>, ClientError>;

    async fn transaction_by_block_number_and_index(
        &self,
        number: u64,
        index: u64,
    ) -> Result<Option<Transaction>, ClientError>;

    /// Ids of the consensus nodes in this group.
    async fn node_id_list(&self) -> Result<Vec<String>, ClientError>;

    /// Groups the connected node participates in.
    async fn group_list(&self) -> Result<Vec<String>, ClientError>;

    async fn pbft_view(&self) -> Result<u64, ClientError>;

    async fn total_transaction_count(&self) -> Result<TransactionCount, ClientError>;

    /// The node's self-reported version string.
    async fn client_version(&self) -> Result<String, ClientError>;
}
