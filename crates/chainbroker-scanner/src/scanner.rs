//! Block-by-block extraction of broker events.
//!
//! ```text
//! scan_block(n)
//!   fetch block (hashes only)
//!   for each tx hash, in block order:
//!       fetch receipt ── absent / timeout ──► Retry
//!       recipient known? ── no ──► skip
//!       decode with the recipient's version ── miss ──► skip
//!   Events([...])
//! ```
//!
//! No state is kept between calls; the caller owns the cursor and decides
//! when to come back to a block that returned [`ScanOutcome::Retry`].

use futures::stream::{self, StreamExt};

use chainbroker_core::{BrokerError, ChainClient, ClientError, DecodedEvent, KnownContracts};

use crate::decoder::DecoderSet;

/// Result of scanning one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The block was fully processed. Events are in transaction order.
    Events(Vec<DecodedEvent>),
    /// A transient condition stopped the scan; scan the same block again later.
    Retry { reason: String },
}

impl ScanOutcome {
    pub fn is_retry(&self) -> bool {
        matches!(self, Self::Retry { .. })
    }

    /// The events, or `None` for a retry.
    pub fn into_events(self) -> Option<Vec<DecodedEvent>> {
        match self {
            Self::Events(events) => Some(events),
            Self::Retry { .. } => None,
        }
    }
}

pub struct BlockScanner<C> {
    client: C,
    decoders: DecoderSet,
    receipt_concurrency: usize,
}

impl<C: ChainClient> BlockScanner<C> {
    /// Scanner with the standard decoders and sequential receipt fetches.
    pub fn new(client: C) -> Self {
        Self {
            client,
            decoders: DecoderSet::standard(),
            receipt_concurrency: 1,
        }
    }

    pub fn with_decoders(mut self, decoders: DecoderSet) -> Self {
        self.decoders = decoders;
        self
    }

    /// Fetch up to `n` receipts at once. Results are still consumed in
    /// block order.
    pub fn with_receipt_concurrency(mut self, n: usize) -> Self {
        self.receipt_concurrency = n.max(1);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn decoders(&self) -> &DecoderSet {
        &self.decoders
    }

    /// Scan block `block_number` for events sent to `contracts`.
    ///
    /// Non-positive block numbers yield no events and make no calls.
    /// Timeouts and missing receipts yield [`ScanOutcome::Retry`]; no partial
    /// event list is ever returned. Other client failures are
    /// [`BrokerError::Web3Rpc`].
    pub async fn scan_block(
        &self,
        block_number: i64,
        contracts: &KnownContracts,
    ) -> Result<ScanOutcome, BrokerError> {
        let number = match u64::try_from(block_number) {
            Ok(n) if n > 0 => n,
            _ => return Ok(ScanOutcome::Events(Vec::new())),
        };

        let block = match self.client.block_by_number(number, false).await {
            Ok(block) => block,
            Err(e) => return classify(number, "block", e),
        };

        let hashes = block.transaction_hashes();
        if hashes.is_empty() {
            tracing::trace!(block = number, "empty block");
            return Ok(ScanOutcome::Events(Vec::new()));
        }
        tracing::debug!(block = number, txs = hashes.len(), "scanning block");

        let mut receipts = stream::iter(hashes)
            .map(|hash| async move { (hash, self.client.transaction_receipt(hash).await) })
            .buffered(self.receipt_concurrency);

        let mut events = Vec::new();
        while let Some((hash, result)) = receipts.next().await {
            let receipt = match result {
                Ok(Some(receipt)) => receipt,
                Ok(None) => {
                    tracing::warn!(block = number, tx = hash, "receipt not available yet");
                    return Ok(ScanOutcome::Retry {
                        reason: format!("no receipt for {hash} in block {number}"),
                    });
                }
                Err(e) => return classify(number, "receipt", e),
            };

            let Some(recipient) = receipt.recipient() else {
                continue;
            };
            let Some(version) = contracts.version_of(recipient) else {
                continue;
            };
            match self.decoders.decode(&receipt, version) {
                Some(event) => {
                    tracing::debug!(
                        block = number,
                        tx = hash,
                        topic = %event.topic,
                        seq = event.event_seq,
                        "decoded broker event"
                    );
                    events.push(event);
                }
                None => tracing::trace!(block = number, tx = hash, %version, "no event in receipt"),
            }
        }

        Ok(ScanOutcome::Events(events))
    }
}

fn classify(block: u64, what: &str, e: ClientError) -> Result<ScanOutcome, BrokerError> {
    if e.is_soft() {
        tracing::warn!(block, error = %e, "{what} fetch soft-failed, block will be retried");
        Ok(ScanOutcome::Retry {
            reason: format!("{what} fetch for block {block}: {e}"),
        })
    } else {
        tracing::error!(block, error = %e, "{what} fetch failed");
        Err(BrokerError::Web3Rpc(format!("{what} fetch for block {block}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_soft_and_hard() {
        let soft = classify(5, "receipt", ClientError::Timeout { ms: 10 }).unwrap();
        assert!(soft.is_retry());

        let hard = classify(
            5,
            "block",
            ClientError::Rpc {
                code: -1,
                message: "boom".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(hard, BrokerError::Web3Rpc(_)));
    }

    #[test]
    fn outcome_accessors() {
        assert_eq!(ScanOutcome::Events(vec![]).into_events(), Some(vec![]));
        assert_eq!(
            ScanOutcome::Retry {
                reason: "x".into()
            }
            .into_events(),
            None
        );
    }
}
