//! `chainbroker info`

use anyhow::Result;

use chainbroker_core::{BrokerConfig, SchemaVersion};
use chainbroker_scanner::DecoderSet;

pub fn run(config: &BrokerConfig) -> Result<()> {
    println!("ChainBroker v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Group:                 {}", config.group_id);
    println!("Nodes:                 {}", config.nodes.join(", "));
    println!("Timeout:               {}ms", config.timeout_ms);
    println!("Receipt concurrency:   {}", config.receipt_concurrency);
    println!("Node version prefix:   {}", config.node_version_prefix);
    println!(
        "Gas:                   price {} / limit {}",
        config.gas.gas_price, config.gas.gas_limit
    );
    println!();

    let decoders = DecoderSet::standard();
    println!("Event versions (current: {}):", SchemaVersion::CURRENT);
    for version in decoders.versions() {
        println!("  v{version}");
    }
    println!();

    let contracts = config.known_contracts();
    if contracts.is_empty() {
        println!("Contracts:             none configured");
    } else {
        let mut listed: Vec<_> = config.contracts.iter().collect();
        listed.sort_by_key(|(address, version)| (**version, address.to_ascii_lowercase()));
        println!("Contracts:");
        for (address, version) in listed {
            let supported = if decoders.supports(*version) { "" } else { "  (unsupported)" };
            println!("  v{version}  {address}{supported}");
        }
    }
    Ok(())
}
