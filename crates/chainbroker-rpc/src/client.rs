//! `RpcChainClient`: the JSON-RPC implementation of [`ChainClient`].
//!
//! Group-scoped methods take the group id as their first parameter. Every
//! call is bounded by the configured timeout, independent of any transport
//! retries underneath.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use chainbroker_core::{
    BrokerConfig, BrokerError, ChainBlock, ChainClient, ClientError, Transaction, TransactionCount,
    TransactionReceipt,
};

use crate::http::HttpTransport;
use crate::parse;
use crate::pool::NodePool;
use crate::request::JsonRpcRequest;
use crate::retry::RetryPolicy;
use crate::transport::RpcTransport;

pub struct RpcChainClient<T> {
    transport: T,
    group_id: u32,
    timeout: Duration,
    next_id: AtomicU64,
}

impl<T: RpcTransport> RpcChainClient<T> {
    pub fn new(transport: T, group_id: u32, timeout: Duration) -> Self {
        Self {
            transport,
            group_id,
            timeout,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue `method` with the group id prepended to `params`.
    async fn group_call(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
        let mut full = Vec::with_capacity(params.len() + 1);
        full.push(Value::from(self.group_id));
        full.extend(params);
        self.call(method, full).await
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);
        tracing::trace!(method, id, "rpc call");

        let resp = tokio::time::timeout(self.timeout, self.transport.send(req))
            .await
            .map_err(|_| {
                tracing::debug!(method, timeout_ms = self.timeout_ms(), "rpc call timed out");
                ClientError::Timeout {
                    ms: self.timeout_ms(),
                }
            })??;

        resp.into_result().map_err(|err| ClientError::Rpc {
            code: err.code,
            message: err.message,
        })
    }

    /// Like [`group_call`](Self::group_call) but a `null` result is an
    /// [`ClientError::EmptyResponse`].
    async fn group_call_required(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<Value, ClientError> {
        match self.group_call(method, params).await? {
            Value::Null => Err(ClientError::EmptyResponse {
                method: method.to_string(),
            }),
            v => Ok(v),
        }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl RpcChainClient<NodePool> {
    /// Build a client over an HTTP node pool from configuration.
    pub fn from_config(config: &BrokerConfig) -> Result<Self, BrokerError> {
        config.validate()?;
        let retry = RetryPolicy::new(&config.retry);
        let nodes = config
            .nodes
            .iter()
            .map(|url| {
                HttpTransport::new(url.clone(), config.timeout(), retry.clone())
                    .map(|t| Arc::new(t) as Arc<dyn RpcTransport>)
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| BrokerError::NodeInit(e.to_string()))?;

        tracing::info!(
            group_id = config.group_id,
            nodes = nodes.len(),
            timeout_ms = config.timeout_ms,
            "chain client configured"
        );
        Ok(Self::new(NodePool::new(nodes), config.group_id, config.timeout()))
    }
}

#[async_trait]
impl<T: RpcTransport> ChainClient for RpcChainClient<T> {
    async fn block_number(&self) -> Result<u64, ClientError> {
        const METHOD: &str = "getBlockNumber";
        let v = self.group_call_required(METHOD, vec![]).await?;
        parse::quantity(&v, METHOD)
    }

    async fn block_by_number(
        &self,
        number: u64,
        full_transactions: bool,
    ) -> Result<ChainBlock, ClientError> {
        const METHOD: &str = "getBlockByNumber";
        let v = self
            .group_call_required(
                METHOD,
                vec![Value::from(format!("{number:#x}")), Value::from(full_transactions)],
            )
            .await?;
        parse::block_from_json(&v, METHOD)
    }

    async fn block_by_hash(
        &self,
        hash: &str,
        full_transactions: bool,
    ) -> Result<ChainBlock, ClientError> {
        const METHOD: &str = "getBlockByHash";
        let v = self
            .group_call_required(METHOD, vec![Value::from(hash), Value::from(full_transactions)])
            .await?;
        parse::block_from_json(&v, METHOD)
    }

    async fn transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionReceipt>, ClientError> {
        const METHOD: &str = "getTransactionReceipt";
        match self.group_call(METHOD, vec![Value::from(hash)]).await? {
            Value::Null => Ok(None),
            v => parse::receipt_from_json(&v, METHOD).map(Some),
        }
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<Option<Transaction>, ClientError> {
        const METHOD: &str = "getTransactionByHash";
        match self.group_call(METHOD, vec![Value::from(hash)]).await? {
            Value::Null => Ok(None),
            v => parse::transaction_from_json(&v, METHOD).map(Some),
        }
    }

    async fn transaction_by_block_number_and_index(
        &self,
        number: u64,
        index: u64,
    ) -> Result<Option<Transaction>, ClientError> {
        const METHOD: &str = "getTransactionByBlockNumberAndIndex";
        let params = vec![
            Value::from(format!("{number:#x}")),
            Value::from(format!("{index:#x}")),
        ];
        match self.group_call(METHOD, params).await? {
            Value::Null => Ok(None),
            v => parse::transaction_from_json(&v, METHOD).map(Some),
        }
    }

    async fn node_id_list(&self) -> Result<Vec<String>, ClientError> {
        const METHOD: &str = "getNodeIDList";
        let v = self.group_call_required(METHOD, vec![]).await?;
        parse::string_list(&v, METHOD)
    }

    async fn group_list(&self) -> Result<Vec<String>, ClientError> {
        const METHOD: &str = "getGroupList";
        match self.call(METHOD, vec![]).await? {
            Value::Null => Err(ClientError::EmptyResponse {
                method: METHOD.to_string(),
            }),
            v => parse::string_list(&v, METHOD),
        }
    }

    async fn pbft_view(&self) -> Result<u64, ClientError> {
        const METHOD: &str = "getPbftView";
        let v = self.group_call_required(METHOD, vec![]).await?;
        parse::quantity(&v, METHOD)
    }

    async fn total_transaction_count(&self) -> Result<TransactionCount, ClientError> {
        const METHOD: &str = "getTotalTransactionCount";
        let v = self.group_call_required(METHOD, vec![]).await?;
        parse::transaction_count_from_json(&v, METHOD)
    }

    async fn client_version(&self) -> Result<String, ClientError> {
        const METHOD: &str = "getClientVersion";
        match self.call(METHOD, vec![]).await? {
            Value::Null => Err(ClientError::EmptyResponse {
                method: METHOD.to_string(),
            }),
            v => parse::client_version_from_json(&v, METHOD),
        }
    }
}
