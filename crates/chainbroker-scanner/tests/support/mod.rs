//! In-memory chain for scanner and explorer tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;
use async_trait::async_trait;
use chainbroker_core::{
    BlockTransaction, ChainBlock, ChainClient, ClientError, ReceiptLog, Transaction,
    TransactionCount, TransactionReceipt,
};
use chainbroker_scanner::fingerprint::keccak256_signature;

/// How the fake answers a receipt request.
pub enum ReceiptReply {
    Found(TransactionReceipt),
    Timeout,
    Fail,
}

#[derive(Default)]
pub struct FakeChain {
    /// `None` makes `block_number` return an empty response.
    pub head: Option<u64>,
    pub blocks: HashMap<u64, ChainBlock>,
    /// Hashes without an entry have no receipt yet.
    pub receipts: HashMap<String, ReceiptReply>,
    pub receipt_delays: HashMap<String, Duration>,
    pub transactions: HashMap<String, Transaction>,
    pub nodes: Vec<String>,
    pub groups: Vec<String>,
    pub version: String,
    pub pbft_view: u64,
    pub tx_count: Option<TransactionCount>,
    /// Every call fails with a node error.
    pub broken: bool,
    pub calls: AtomicUsize,
}

impl FakeChain {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.broken {
            return Err(ClientError::Rpc {
                code: -32603,
                message: "internal error".into(),
            });
        }
        Ok(())
    }

    pub fn add_block(&mut self, number: u64, hashes: &[&str]) {
        self.blocks.insert(
            number,
            ChainBlock {
                number,
                hash: format!("0xb{number}"),
                parent_hash: format!("0xb{}", number.saturating_sub(1)),
                timestamp: 1_600_000_000_000 + number as i64,
                sealer: "0x1".into(),
                transactions: hashes
                    .iter()
                    .map(|h| BlockTransaction::Hash(h.to_string()))
                    .collect(),
            },
        );
    }

    pub fn add_receipt(&mut self, receipt: TransactionReceipt) {
        self.receipts.insert(
            receipt.transaction_hash.clone(),
            ReceiptReply::Found(receipt),
        );
    }
}

fn full_block(block: &ChainBlock, txs: &HashMap<String, Transaction>) -> ChainBlock {
    let mut block = block.clone();
    block.transactions = block
        .transactions
        .iter()
        .map(|t| match txs.get(t.hash()) {
            Some(tx) => BlockTransaction::Full(tx.clone()),
            None => t.clone(),
        })
        .collect();
    block
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn block_number(&self) -> Result<u64, ClientError> {
        self.enter()?;
        self.head.ok_or(ClientError::EmptyResponse {
            method: "getBlockNumber".into(),
        })
    }

    async fn block_by_number(&self, number: u64, full: bool) -> Result<ChainBlock, ClientError> {
        self.enter()?;
        match self.blocks.get(&number) {
            Some(b) if full => Ok(full_block(b, &self.transactions)),
            Some(b) => Ok(b.clone()),
            None => Err(ClientError::EmptyResponse {
                method: "getBlockByNumber".into(),
            }),
        }
    }

    async fn block_by_hash(&self, hash: &str, full: bool) -> Result<ChainBlock, ClientError> {
        self.enter()?;
        match self.blocks.values().find(|b| b.hash == hash) {
            Some(b) if full => Ok(full_block(b, &self.transactions)),
            Some(b) => Ok(b.clone()),
            None => Err(ClientError::EmptyResponse {
                method: "getBlockByHash".into(),
            }),
        }
    }

    async fn transaction_receipt(
        &self,
        hash: &str,
    ) -> Result<Option<TransactionReceipt>, ClientError> {
        self.enter()?;
        if let Some(delay) = self.receipt_delays.get(hash) {
            tokio::time::sleep(*delay).await;
        }
        match self.receipts.get(hash) {
            Some(ReceiptReply::Found(r)) => Ok(Some(r.clone())),
            Some(ReceiptReply::Timeout) => Err(ClientError::Timeout { ms: 10_000 }),
            Some(ReceiptReply::Fail) => Err(ClientError::Transport("connection reset".into())),
            None => Ok(None),
        }
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<Option<Transaction>, ClientError> {
        self.enter()?;
        Ok(self.transactions.get(hash).cloned())
    }

    async fn transaction_by_block_number_and_index(
        &self,
        number: u64,
        index: u64,
    ) -> Result<Option<Transaction>, ClientError> {
        self.enter()?;
        let Some(block) = self.blocks.get(&number) else {
            return Ok(None);
        };
        Ok(usize::try_from(index)
            .ok()
            .and_then(|i| block.transactions.get(i))
            .and_then(|t| self.transactions.get(t.hash()))
            .cloned())
    }

    async fn node_id_list(&self) -> Result<Vec<String>, ClientError> {
        self.enter()?;
        Ok(self.nodes.clone())
    }

    async fn group_list(&self) -> Result<Vec<String>, ClientError> {
        self.enter()?;
        Ok(self.groups.clone())
    }

    async fn pbft_view(&self) -> Result<u64, ClientError> {
        self.enter()?;
        Ok(self.pbft_view)
    }

    async fn total_transaction_count(&self) -> Result<TransactionCount, ClientError> {
        self.enter()?;
        self.tx_count.ok_or(ClientError::EmptyResponse {
            method: "getTotalTransactionCount".into(),
        })
    }

    async fn client_version(&self) -> Result<String, ClientError> {
        self.enter()?;
        Ok(self.version.clone())
    }
}

// ─── Receipt builders ─────────────────────────────────────────────────────────

pub const V1_SIGNATURE: &str = "LogWeEvent(string,uint256,uint256,string,string)";

/// A successful receipt for `hash` sent to `to`, with no logs.
pub fn plain_receipt(hash: &str, block: u64, to: &str) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: hash.into(),
        block_number: block,
        from: "0x00000000000000000000000000000000000000aa".into(),
        to: Some(to.into()),
        status: "0x0".into(),
        output: "0x".into(),
        logs: vec![],
    }
}

/// A receipt carrying a version 1 broker event emitted by `contract`.
pub fn v1_event_receipt(
    hash: &str,
    block: u64,
    contract: &str,
    topic: &str,
    seq: u64,
    content: &str,
) -> TransactionReceipt {
    let data = DynSolValue::Tuple(vec![
        DynSolValue::String(topic.into()),
        DynSolValue::Uint(U256::from(seq), 256),
        DynSolValue::Uint(U256::from(block), 256),
        DynSolValue::String(content.into()),
        DynSolValue::String("{}".into()),
    ])
    .abi_encode_params();

    let mut receipt = plain_receipt(hash, block, contract);
    receipt.logs.push(ReceiptLog {
        address: contract.into(),
        topics: vec![keccak256_signature(V1_SIGNATURE)],
        data: format!("0x{}", hex::encode(data)),
    });
    receipt
}
