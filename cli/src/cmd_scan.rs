//! `chainbroker scan`: walk a block range and print decoded broker events.
//!
//! Blocks are scanned strictly in order. A block that soft-fails is retried
//! with backoff; the scan stops rather than skip it.

use std::time::Duration;

use anyhow::{bail, Result};

use chainbroker_core::{BrokerConfig, ChainClient};
use chainbroker_scanner::{BlockScanner, ScanOutcome};

pub async fn run<C: ChainClient>(
    client: C,
    config: &BrokerConfig,
    from: i64,
    to: i64,
    retries: u32,
) -> Result<()> {
    if from > to {
        bail!("--from {from} is after --to {to}");
    }
    let contracts = config.known_contracts();
    if contracts.is_empty() {
        tracing::warn!("no contracts configured, nothing will match");
    }

    let scanner = BlockScanner::new(client).with_receipt_concurrency(config.receipt_concurrency);
    let base_delay = Duration::from_millis(config.retry.initial_backoff_ms.max(1));
    let max_delay = Duration::from_millis(config.retry.max_backoff_ms.max(1));

    let mut total = 0usize;
    for block in from..=to {
        let mut attempt = 0u32;
        let events = loop {
            match scanner.scan_block(block, &contracts).await? {
                ScanOutcome::Events(events) => break events,
                ScanOutcome::Retry { reason } => {
                    attempt += 1;
                    if attempt > retries {
                        bail!("block {block} still unavailable after {retries} retries: {reason}");
                    }
                    let delay = base_delay
                        .saturating_mul(2u32.saturating_pow(attempt - 1))
                        .min(max_delay);
                    tracing::warn!(
                        block,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %reason,
                        "retrying block"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        };

        for event in &events {
            println!("{}", serde_json::to_string(event)?);
        }
        total += events.len();
    }

    tracing::info!(from, to, events = total, "scan complete");
    Ok(())
}
