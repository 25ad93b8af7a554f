//! Read-only views of the group for dashboards and operators.

use chainbroker_core::{
    BlockListing, BrokerError, ChainClient, ClientError, GroupGeneral, NodeListing,
    TransactionListing,
};

/// Characters trimmed from the end of a node id to form its display name.
const NODE_NAME_TRIM: usize = 10;

/// Which block or transaction to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainQuery {
    /// The head block, or the first transaction of it.
    Latest,
    ByHash(String),
    ByNumber(u64),
}

fn web3(what: &str, e: ClientError) -> BrokerError {
    tracing::error!(error = %e, "{what} failed");
    BrokerError::Web3Rpc(format!("{what}: {e}"))
}

fn is_missing(e: &ClientError) -> bool {
    matches!(e, ClientError::EmptyResponse { .. })
}

pub struct ChainExplorer<C> {
    client: C,
}

impl<C: ChainClient> ChainExplorer<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    /// Current head; `0` when the node has nothing to report.
    pub async fn block_height(&self) -> Result<u64, BrokerError> {
        match self.client.block_number().await {
            Ok(n) => Ok(n),
            Err(e) if is_missing(&e) => Ok(0),
            Err(e) => {
                tracing::error!(error = %e, "get block height failed");
                Err(BrokerError::GetBlockHeight(e.to_string()))
            }
        }
    }

    pub async fn group_general(&self) -> Result<GroupGeneral, BrokerError> {
        let count = self
            .client
            .total_transaction_count()
            .await
            .map_err(|e| web3("total transaction count", e))?;
        let nodes = self
            .client
            .node_id_list()
            .await
            .map_err(|e| web3("node id list", e))?;
        Ok(GroupGeneral {
            node_count: nodes.len(),
            latest_block: count.block_number,
            transaction_count: count.tx_sum,
        })
    }

    /// `None` when a block queried by number is missing or empty.
    pub async fn list_transactions(
        &self,
        query: &ChainQuery,
    ) -> Result<Option<Vec<TransactionListing>>, BrokerError> {
        match query {
            ChainQuery::Latest => {
                let head = self
                    .client
                    .block_number()
                    .await
                    .map_err(|e| web3("block number", e))?;
                let tx = self
                    .client
                    .transaction_by_block_number_and_index(head, 0)
                    .await
                    .map_err(|e| web3("transaction by block and index", e))?;
                Ok(Some(tx.iter().map(TransactionListing::from).collect()))
            }
            ChainQuery::ByHash(hash) => {
                let tx = self
                    .client
                    .transaction_by_hash(hash)
                    .await
                    .map_err(|e| web3("transaction by hash", e))?;
                Ok(Some(tx.iter().map(TransactionListing::from).collect()))
            }
            ChainQuery::ByNumber(number) => {
                let block = match self.client.block_by_number(*number, true).await {
                    Ok(block) => block,
                    Err(e) if is_missing(&e) => return Ok(None),
                    Err(e) => return Err(web3("block by number", e)),
                };
                let listings: Vec<_> = block
                    .full_transactions()
                    .map(TransactionListing::from)
                    .collect();
                Ok((!listings.is_empty()).then_some(listings))
            }
        }
    }

    /// `None` when the block does not exist.
    pub async fn list_blocks(
        &self,
        query: &ChainQuery,
    ) -> Result<Option<Vec<BlockListing>>, BrokerError> {
        let fetched = match query {
            ChainQuery::Latest => {
                let head = self
                    .client
                    .block_number()
                    .await
                    .map_err(|e| web3("block number", e))?;
                self.client.block_by_number(head, false).await
            }
            ChainQuery::ByHash(hash) => self.client.block_by_hash(hash, false).await,
            ChainQuery::ByNumber(number) => self.client.block_by_number(*number, false).await,
        };
        match fetched {
            Ok(block) => Ok(Some(vec![BlockListing::from(&block)])),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(web3("block lookup", e)),
        }
    }

    /// The first consensus node of the group, or `None` if there are none.
    pub async fn list_nodes(&self) -> Result<Option<Vec<NodeListing>>, BrokerError> {
        let ids = self
            .client
            .node_id_list()
            .await
            .map_err(|e| web3("node id list", e))?;
        let Some(node_id) = ids.into_iter().next() else {
            return Ok(None);
        };
        let pbft_view = self
            .client
            .pbft_view()
            .await
            .map_err(|e| web3("pbft view", e))?;
        let block_number = self
            .client
            .block_number()
            .await
            .map_err(|e| web3("block number", e))?;

        Ok(Some(vec![NodeListing {
            node_name: node_name(&node_id),
            node_id,
            block_number,
            pbft_view,
            active: true,
        }]))
    }

    pub async fn list_group_ids(&self) -> Result<Vec<String>, BrokerError> {
        self.client.group_list().await.map_err(|e| {
            tracing::error!(error = %e, "list group ids failed");
            BrokerError::TransactionExecute(format!("group list: {e}"))
        })
    }

    /// Fail unless the node reports a version containing `prefix`.
    pub async fn check_node_version(&self, prefix: &str) -> Result<String, BrokerError> {
        let version = self
            .client
            .client_version()
            .await
            .map_err(|e| BrokerError::NodeInit(format!("cannot read node version: {e}")))?;
        if !version.contains(prefix) {
            return Err(BrokerError::NodeInit(format!(
                "node version {version} is not supported, expected {prefix}x"
            )));
        }
        tracing::info!(%version, "node version accepted");
        Ok(version)
    }
}

/// Node id without its last few characters; short ids are kept whole.
fn node_name(node_id: &str) -> String {
    let chars: Vec<char> = node_id.chars().collect();
    if chars.len() > NODE_NAME_TRIM {
        chars[..chars.len() - NODE_NAME_TRIM].iter().collect()
    } else {
        node_id.to_string()
    }
}
