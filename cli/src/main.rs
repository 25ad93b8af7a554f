//! ChainBroker CLI: inspect a FISCO BCOS group and scan blocks for broker events.
//!
//! # Commands
//! ```text
//! chainbroker height
//! chainbroker general
//! chainbroker nodes
//! chainbroker groups
//! chainbroker block  [--number <N> | --hash <H>]
//! chainbroker tx     [--number <N> | --hash <H>]
//! chainbroker scan   --from <A> --to <B> [--retries <R>]
//! chainbroker info
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use chainbroker_core::{init_tracing, BrokerConfig};
use chainbroker_rpc::{NodePool, RpcChainClient};
use chainbroker_scanner::{ChainExplorer, ChainQuery};

mod cmd_info;
mod cmd_scan;

#[derive(Parser)]
#[command(
    name = "chainbroker",
    about = "Chain-backed event broker: registry, block scanner and group explorer",
    version
)]
struct Cli {
    /// Broker configuration file (.yaml / .yml / .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured node endpoints
    #[arg(long, global = true, num_args = 1..)]
    node: Vec<String>,

    /// Override the configured group id
    #[arg(long, global = true)]
    group: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current block height
    Height,

    /// Group overview: node count, latest block, transaction count
    General,

    /// List the group's leading consensus node
    Nodes,

    /// List the groups the node belongs to
    Groups,

    /// Show a block (the latest when neither flag is given)
    Block {
        #[arg(long, conflicts_with = "hash")]
        number: Option<u64>,
        #[arg(long)]
        hash: Option<String>,
    },

    /// Show transactions of a block, or one transaction by hash
    Tx {
        #[arg(long, conflicts_with = "hash")]
        number: Option<u64>,
        #[arg(long)]
        hash: Option<String>,
    },

    /// Scan a block range for broker events, printing one JSON line per event
    Scan {
        #[arg(long, allow_hyphen_values = true)]
        from: i64,
        #[arg(long, allow_hyphen_values = true)]
        to: i64,
        /// Attempts per block after a soft failure before giving up
        #[arg(long, default_value_t = 3)]
        retries: u32,
    },

    /// Show configuration and supported event versions
    Info,
}

fn query(number: Option<u64>, hash: Option<String>) -> ChainQuery {
    match (number, hash) {
        (Some(n), _) => ChainQuery::ByNumber(n),
        (None, Some(h)) => ChainQuery::ByHash(h),
        (None, None) => ChainQuery::Latest,
    }
}

fn load_config(cli: &Cli) -> Result<BrokerConfig> {
    let mut config = match &cli.config {
        Some(path) => BrokerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BrokerConfig::default(),
    };
    if !cli.node.is_empty() {
        config.nodes = cli.node.clone();
    }
    if let Some(group) = cli.group {
        config.group_id = group;
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn explorer(config: &BrokerConfig) -> Result<ChainExplorer<RpcChainClient<NodePool>>> {
    Ok(ChainExplorer::new(RpcChainClient::from_config(config)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.log);

    match cli.command {
        Commands::Height => {
            println!("{}", explorer(&config)?.block_height().await?);
        }
        Commands::General => {
            print_json(&explorer(&config)?.group_general().await?)?;
        }
        Commands::Nodes => {
            print_json(&explorer(&config)?.list_nodes().await?.unwrap_or_default())?;
        }
        Commands::Groups => {
            print_json(&explorer(&config)?.list_group_ids().await?)?;
        }
        Commands::Block { number, hash } => {
            match explorer(&config)?.list_blocks(&query(number, hash)).await? {
                Some(blocks) => print_json(&blocks)?,
                None => anyhow::bail!("block not found"),
            }
        }
        Commands::Tx { number, hash } => {
            let txs = explorer(&config)?
                .list_transactions(&query(number, hash))
                .await?
                .unwrap_or_default();
            print_json(&txs)?;
        }
        Commands::Scan { from, to, retries } => {
            let explorer = explorer(&config)?;
            explorer
                .check_node_version(&config.node_version_prefix)
                .await?;
            cmd_scan::run(explorer.into_client(), &config, from, to, retries).await?;
        }
        Commands::Info => cmd_info::run(&config)?,
    }
    Ok(())
}
