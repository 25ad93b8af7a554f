//! Shared types for the registry, scanner and explorer.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BrokerError;

/// The all-zero address returned by a deploy that did not produce a contract.
pub const EMPTY_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Returns `true` for `""`, `"0x"` and any all-zero hex address.
pub fn is_empty_address(address: &str) -> bool {
    let hex = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    hex.bytes().all(|b| b == b'0')
}

// ─── SchemaVersion ───────────────────────────────────────────────────────────

/// One generation of the topic-control contract pair. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct SchemaVersion(u64);

impl SchemaVersion {
    pub const V1: Self = Self(1);
    pub const V2: Self = Self(2);

    /// The version new deployments are made in.
    pub const CURRENT: Self = Self::V2;

    /// Returns `None` for `0`.
    pub fn new(version: u64) -> Option<Self> {
        (version > 0).then_some(Self(version))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for SchemaVersion {
    type Error = BrokerError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| BrokerError::schema_mismatch("schema version must be positive"))
    }
}

impl From<SchemaVersion> for u64 {
    fn from(v: SchemaVersion) -> Self {
        v.0
    }
}

impl FromStr for SchemaVersion {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u64 = s
            .trim()
            .parse()
            .map_err(|_| BrokerError::schema_mismatch(format!("non-numeric version '{s}'")))?;
        Self::try_from(n)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// One registered contract generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub version: SchemaVersion,
    pub address: String,
}

/// Address → schema version lookup used by the scanner.
///
/// Address matching is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct KnownContracts {
    by_address: HashMap<String, SchemaVersion>,
}

impl KnownContracts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a registry listing (version → address).
    pub fn from_registry(addresses: &BTreeMap<SchemaVersion, String>) -> Self {
        addresses
            .iter()
            .map(|(version, address)| (address.clone(), *version))
            .collect()
    }

    pub fn insert(&mut self, address: impl AsRef<str>, version: SchemaVersion) {
        self.by_address
            .insert(address.as_ref().to_ascii_lowercase(), version);
    }

    /// The schema version registered for `address`, if any.
    pub fn version_of(&self, address: &str) -> Option<SchemaVersion> {
        self.by_address.get(&address.to_ascii_lowercase()).copied()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.version_of(address).is_some()
    }

    pub fn versions(&self) -> BTreeSet<SchemaVersion> {
        self.by_address.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, SchemaVersion)> for KnownContracts {
    fn from_iter<I: IntoIterator<Item = (S, SchemaVersion)>>(iter: I) -> Self {
        let mut known = Self::new();
        for (address, version) in iter {
            known.insert(address, version);
        }
        known
    }
}

/// An opaque signing identity owned by the broker for its chain session.
///
/// Key material is held by the signing backend; only the account is visible here.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    account: String,
}

impl Credentials {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

// ─── Chain data ──────────────────────────────────────────────────────────────

/// A full transaction body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    /// `None` for contract creation.
    pub to: Option<String>,
    pub block_number: u64,
    pub input: String,
}

/// A transaction reference inside a block body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockTransaction {
    /// Returned when the block was fetched without full transactions.
    Hash(String),
    Full(Transaction),
}

impl BlockTransaction {
    pub fn hash(&self) -> &str {
        match self {
            Self::Hash(h) => h,
            Self::Full(tx) => &tx.hash,
        }
    }
}

/// A block as produced by the chain. Never mutated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainBlock {
    pub number: u64,
    pub hash: String,
    pub parent_hash: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// Sealer index as a hex quantity (`0x…`).
    pub sealer: String,
    /// In block order.
    pub transactions: Vec<BlockTransaction>,
}

impl ChainBlock {
    pub fn transaction_hashes(&self) -> Vec<&str> {
        self.transactions.iter().map(BlockTransaction::hash).collect()
    }

    pub fn full_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter_map(|tx| match tx {
            BlockTransaction::Full(t) => Some(t),
            BlockTransaction::Hash(_) => None,
        })
    }

    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// The sealer's index in the consensus node list.
    pub fn sealer_index(&self) -> Option<u64> {
        let hex = self.sealer.strip_prefix("0x").unwrap_or(&self.sealer);
        u64::from_str_radix(hex, 16).ok()
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// A log entry emitted during transaction execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLog {
    pub address: String,
    pub topics: Vec<String>,
    /// Hex-encoded ABI data (`0x…`).
    pub data: String,
}

/// The chain's record of a transaction's execution outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
    pub from: String,
    /// The recipient contract; `None` for contract creation.
    pub to: Option<String>,
    /// `"0x0"` on success.
    pub status: String,
    pub output: String,
    pub logs: Vec<ReceiptLog>,
}

impl TransactionReceipt {
    pub fn is_success(&self) -> bool {
        let hex = self.status.strip_prefix("0x").unwrap_or(&self.status);
        hex.bytes().all(|b| b == b'0')
    }

    pub fn recipient(&self) -> Option<&str> {
        self.to.as_deref()
    }
}

/// A broker event reconstructed from a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedEvent {
    /// Broker topic the event was published to.
    pub topic: String,
    pub content: Vec<u8>,
    pub extensions: BTreeMap<String, String>,
    /// `<topic hash>-<seq>-<block>`, stable across rescans.
    pub event_id: String,
    pub event_seq: u64,
    pub schema_version: SchemaVersion,
    pub contract_address: String,
    pub tx_hash: String,
    pub block_number: u64,
}

// ─── Explorer shapes ─────────────────────────────────────────────────────────

/// Chain-wide transaction counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCount {
    pub block_number: u64,
    pub tx_sum: u64,
    pub failed_tx_sum: u64,
}

/// Group overview: node, block and transaction counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupGeneral {
    pub node_count: usize,
    pub latest_block: u64,
    pub transaction_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockListing {
    pub hash: String,
    pub number: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub tx_count: usize,
    pub sealer: String,
    pub sealer_index: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionListing {
    pub hash: String,
    pub from: String,
    pub to: Option<String>,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeListing {
    pub node_id: String,
    pub node_name: String,
    pub block_number: u64,
    pub pbft_view: u64,
    pub active: bool,
}

impl From<&Transaction> for TransactionListing {
    fn from(tx: &Transaction) -> Self {
        Self {
            hash: tx.hash.clone(),
            from: tx.from.clone(),
            to: tx.to.clone(),
            block_number: tx.block_number,
        }
    }
}

impl From<&ChainBlock> for BlockListing {
    fn from(block: &ChainBlock) -> Self {
        Self {
            hash: block.hash.clone(),
            number: block.number,
            timestamp: block.timestamp_utc(),
            tx_count: block.tx_count(),
            sealer: block.sealer.clone(),
            sealer_index: block.sealer_index(),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
