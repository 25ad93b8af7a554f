//! Broker startup: make sure the current topic-control version is deployed
//! and registered, then hand back the contracts to scan for.

use chainbroker_core::{BrokerError, Credentials, KnownContracts, SchemaVersion, TableStore};

use crate::deployer::{ContractBackend, ContractDeployer};
use crate::registry::ContractRegistry;

/// Ensure [`SchemaVersion::CURRENT`] has a registered controller.
///
/// When another broker registers the same version between our read and our
/// insert, our freshly deployed pair is abandoned and the registered address
/// is used instead.
pub async fn ensure_topic_control<S, B>(
    registry: &ContractRegistry<S>,
    deployer: &ContractDeployer<B>,
    credentials: &Credentials,
) -> Result<KnownContracts, BrokerError>
where
    S: TableStore,
    B: ContractBackend,
{
    registry.ensure_table().await?;

    let mut addresses = registry.list_addresses().await?;
    if !addresses.contains_key(&SchemaVersion::CURRENT) {
        tracing::info!(
            version = %SchemaVersion::CURRENT,
            "no topic-control contract registered, deploying"
        );
        let address = deployer.deploy_topic_control(credentials).await?;
        if !registry.add_address(SchemaVersion::CURRENT, &address).await? {
            tracing::warn!(
                version = %SchemaVersion::CURRENT,
                abandoned = %address,
                "registration lost, using registered address"
            );
        }
        addresses = registry.list_addresses().await?;
        if !addresses.contains_key(&SchemaVersion::CURRENT) {
            return Err(BrokerError::TransactionExecute(format!(
                "version {} still unregistered after deploy",
                SchemaVersion::CURRENT
            )));
        }
    }

    let known = KnownContracts::from_registry(&addresses);
    tracing::info!(contracts = known.len(), "topic-control contracts loaded");
    Ok(known)
}
