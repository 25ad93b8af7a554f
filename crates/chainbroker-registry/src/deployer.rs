//! Deployment and loading of the topic-control contract pair.
//!
//! Each schema version has two cooperating contracts: the `Topic` data
//! contract and the `TopicController` that fronts it. The controller is
//! constructed with the data contract's address and is the one registered.

use std::fmt;
use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;

use chainbroker_core::types::is_empty_address;
use chainbroker_core::{BrokerError, ClientError, Credentials, GasConfig};

/// The contract roles in a topic-control pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractRole {
    /// Data contract.
    Topic,
    /// Controller contract; takes the data contract address at construction.
    TopicController,
}

impl fmt::Display for ContractRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Topic => f.write_str("Topic"),
            Self::TopicController => f.write_str("TopicController"),
        }
    }
}

/// Submits contract-creation transactions.
///
/// Implementations sign with `credentials` and wait for the receipt; the
/// returned string is the new contract's address, which may be the all-zero
/// address when the chain rejected the creation.
#[async_trait]
pub trait ContractBackend: Send + Sync {
    async fn deploy(
        &self,
        role: ContractRole,
        constructor_args: &[String],
        credentials: &Credentials,
        gas: &GasConfig,
    ) -> Result<String, ClientError>;
}

// ─── Loaded contracts ────────────────────────────────────────────────────────

fn parse_address(role: ContractRole, address: &str) -> Result<Address, BrokerError> {
    let load_error = |reason: String| BrokerError::LoadContract {
        role: role.to_string(),
        reason,
    };
    if is_empty_address(address) {
        return Err(load_error(format!("empty address '{address}'")));
    }
    address
        .parse::<Address>()
        .map_err(|e| load_error(format!("invalid address '{address}': {e}")))
}

/// A deployed `Topic` data contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicContract {
    address: Address,
}

impl TopicContract {
    pub fn load(address: &str) -> Result<Self, BrokerError> {
        Ok(Self {
            address: parse_address(ContractRole::Topic, address)?,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

/// A deployed `TopicController` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicControllerContract {
    address: Address,
}

impl TopicControllerContract {
    pub fn load(address: &str) -> Result<Self, BrokerError> {
        Ok(Self {
            address: parse_address(ContractRole::TopicController, address)?,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

/// A loaded contract of either role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractHandle {
    Topic(TopicContract),
    TopicController(TopicControllerContract),
}

impl ContractHandle {
    pub fn role(&self) -> ContractRole {
        match self {
            Self::Topic(_) => ContractRole::Topic,
            Self::TopicController(_) => ContractRole::TopicController,
        }
    }

    pub fn address(&self) -> Address {
        match self {
            Self::Topic(c) => c.address(),
            Self::TopicController(c) => c.address(),
        }
    }
}

// ─── Deployer ────────────────────────────────────────────────────────────────

/// Deploys topic-control pairs through a [`ContractBackend`].
pub struct ContractDeployer<B> {
    backend: B,
    gas: GasConfig,
    timeout: Duration,
}

impl<B: ContractBackend> ContractDeployer<B> {
    /// `timeout` bounds each of the two deploy steps separately.
    pub fn new(backend: B, gas: GasConfig, timeout: Duration) -> Self {
        Self {
            backend,
            gas,
            timeout,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Deploy a `Topic` contract, then a `TopicController` pointing at it.
    ///
    /// Returns the controller's address. Any failed step aborts the whole
    /// operation; the controller is never attempted after a data-contract
    /// failure.
    pub async fn deploy_topic_control(
        &self,
        credentials: &Credentials,
    ) -> Result<String, BrokerError> {
        let topic = self.deploy_one(ContractRole::Topic, &[], credentials).await?;
        tracing::info!(address = %topic, "deployed Topic contract");

        let controller = self
            .deploy_one(ContractRole::TopicController, &[topic.clone()], credentials)
            .await?;
        tracing::info!(address = %controller, topic = %topic, "deployed TopicController contract");
        Ok(controller)
    }

    /// Load an existing contract of `role` at `address`.
    pub fn load(&self, role: ContractRole, address: &str) -> Result<ContractHandle, BrokerError> {
        match role {
            ContractRole::Topic => TopicContract::load(address).map(ContractHandle::Topic),
            ContractRole::TopicController => {
                TopicControllerContract::load(address).map(ContractHandle::TopicController)
            }
        }
    }

    async fn deploy_one(
        &self,
        role: ContractRole,
        args: &[String],
        credentials: &Credentials,
    ) -> Result<String, BrokerError> {
        let deploy_error = |reason: String| {
            tracing::error!(%role, %reason, "contract deployment failed");
            BrokerError::DeployContract {
                role: role.to_string(),
                reason,
            }
        };

        let address = tokio::time::timeout(
            self.timeout,
            self.backend.deploy(role, args, credentials, &self.gas),
        )
        .await
        .map_err(|_| deploy_error(format!("timed out after {}ms", self.timeout.as_millis())))?
        .map_err(|e| deploy_error(e.to_string()))?;

        if is_empty_address(&address) {
            return Err(deploy_error(format!("deploy returned empty address '{address}'")));
        }
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unused;

    #[async_trait]
    impl ContractBackend for Unused {
        async fn deploy(
            &self,
            _role: ContractRole,
            _args: &[String],
            _credentials: &Credentials,
            _gas: &GasConfig,
        ) -> Result<String, ClientError> {
            Err(ClientError::Transport("not wired".into()))
        }
    }

    fn deployer() -> ContractDeployer<Unused> {
        ContractDeployer::new(Unused, GasConfig::default(), Duration::from_secs(1))
    }

    #[test]
    fn load_by_role() {
        let addr = "0x8a1b4c3d2e1f00112233445566778899aabbccdd";
        let handle = deployer().load(ContractRole::TopicController, addr).unwrap();
        assert_eq!(handle.role(), ContractRole::TopicController);
        assert_eq!(handle.address(), addr.parse::<Address>().unwrap());

        let topic = deployer().load(ContractRole::Topic, addr).unwrap();
        assert!(matches!(topic, ContractHandle::Topic(_)));
    }

    #[test]
    fn load_rejects_empty_and_invalid() {
        let empty = deployer()
            .load(ContractRole::Topic, chainbroker_core::EMPTY_ADDRESS)
            .unwrap_err();
        assert!(matches!(empty, BrokerError::LoadContract { .. }));

        let bad = deployer().load(ContractRole::Topic, "0xnothex").unwrap_err();
        assert!(bad.to_string().contains("Topic"));
    }

    #[test]
    fn role_display() {
        assert_eq!(ContractRole::TopicController.to_string(), "TopicController");
    }
}
