//! chainbroker-rpc: the JSON-RPC implementation of [`ChainClient`].
//!
//! ```text
//! RpcChainClient ──► NodePool ──► HttpTransport (node 1)
//!   (timeouts,          │         HttpTransport (node 2)
//!    parsing)           └──────►  ...
//! ```
//!
//! - [`RpcTransport`]: async trait every transport implements
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`]: wire types
//! - [`HttpTransport`]: reqwest transport with retry of transient failures
//! - [`NodePool`]: round-robin failover across a group's nodes
//! - [`RpcChainClient`]: bounded, typed chain calls
//!
//! [`ChainClient`]: chainbroker_core::ChainClient

pub mod client;
pub mod error;
pub mod http;
pub mod parse;
pub mod pool;
pub mod request;
pub mod retry;
pub mod transport;

pub use client::RpcChainClient;
pub use error::TransportError;
pub use http::HttpTransport;
pub use pool::NodePool;
pub use request::{JsonRpcRequest, JsonRpcResponse, RpcId};
pub use retry::RetryPolicy;
pub use transport::RpcTransport;
