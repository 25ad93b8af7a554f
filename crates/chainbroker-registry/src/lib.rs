//! chainbroker-registry: the versioned topic-control contract registry.
//!
//! - [`ContractRegistry`]: schema version → controller address, stored in the
//!   `WeEvent` key-value table
//! - [`ContractDeployer`]: deploys the data/controller contract pair and loads
//!   existing contracts by role
//! - [`bootstrap::ensure_topic_control`]: startup glue that registers the
//!   current version if no broker has yet

pub mod bootstrap;
pub mod deployer;
pub mod registry;

pub use bootstrap::ensure_topic_control;
pub use deployer::{
    ContractBackend, ContractDeployer, ContractHandle, ContractRole, TopicContract,
    TopicControllerContract,
};
pub use registry::ContractRegistry;
