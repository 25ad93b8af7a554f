//! chainbroker-core: shared foundation for the chain-backed event broker.
//!
//! # Architecture
//!
//! ```text
//! BlockScanner ──► ChainClient (blocks, receipts) ──► EventDecoder ──► Vec<DecodedEvent>
//!
//! ContractRegistry ──► TableStore ("WeEvent" key-value table)
//! ContractDeployer ──► ContractBackend (data + controller contracts)
//! ```
//!
//! This crate defines the types every other crate speaks: the [`ChainClient`]
//! capability, the [`TableStore`] registry backend, the error taxonomy and
//! the broker configuration.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod table;
pub mod types;

pub use client::ChainClient;
pub use config::{BrokerConfig, GasConfig, RetrySettings};
pub use error::{BrokerError, ClientError, TableError};
pub use logging::{init_tracing, LogConfig};
pub use table::{MemoryTableStore, Record, TableSchema, TableStore};
pub use types::{
    BlockListing, BlockTransaction, ChainBlock, Credentials, DecodedEvent, GroupGeneral,
    KnownContracts, NodeListing, ReceiptLog, RegistryEntry, SchemaVersion, Transaction,
    TransactionCount, TransactionListing, TransactionReceipt, EMPTY_ADDRESS,
};
