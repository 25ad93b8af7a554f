//! Versioned decoding of broker events from transaction receipts.
//!
//! Every topic-control generation emits a `LogWeEvent` when a message is
//! published. The event's non-indexed parameters carry the topic name, the
//! per-topic sequence number, the block the publish was accepted in, the
//! content and the JSON-encoded extensions. Generations differ in how the
//! content is encoded, which changes the signature and therefore the
//! fingerprint in `topics[0]`.

use std::collections::{BTreeMap, HashMap};

use alloy_dyn_abi::{DynSolType, DynSolValue};
use chainbroker_core::{DecodedEvent, ReceiptLog, SchemaVersion, TransactionReceipt};
use sha2::{Digest, Sha256};

use crate::fingerprint;

/// Version 1: content as a UTF-8 `string`.
pub const V1_SIGNATURE: &str = "LogWeEvent(string,uint256,uint256,string,string)";
/// Version 2: content as raw `bytes`.
pub const V2_SIGNATURE: &str = "LogWeEvent(string,uint256,uint256,bytes,string)";

/// Decodes the broker event of one schema version.
///
/// Implementations never fail: anything that does not look like this
/// version's event is a non-match.
pub trait EventDecoder: Send + Sync {
    fn version(&self) -> SchemaVersion;

    /// Canonical signature of the event this decoder understands.
    fn signature(&self) -> &str;

    /// The broker event carried by `receipt`, if any.
    ///
    /// The first log with this version's fingerprint is decoded, whichever
    /// contract emitted it; the caller has already matched the recipient.
    fn decode(&self, receipt: &TransactionReceipt) -> Option<DecodedEvent>;
}

/// Fields common to every `LogWeEvent` generation.
struct RawWeEvent {
    topic: String,
    event_seq: u64,
    event_block: u64,
    content: Vec<u8>,
    extensions: String,
}

/// Stable id of an event: `<topic hash>-<seq>-<block>`.
///
/// The topic hash is the first 8 bytes of SHA-256 over the topic name.
pub fn event_id(topic: &str, event_seq: u64, event_block: u64) -> String {
    let digest = Sha256::digest(topic.as_bytes());
    format!("{}-{event_seq}-{event_block}", hex::encode(&digest[..8]))
}

fn as_u64(value: &DynSolValue) -> Option<u64> {
    match value {
        DynSolValue::Uint(n, _) => u64::try_from(*n).ok(),
        _ => None,
    }
}

fn as_string(value: &DynSolValue) -> Option<String> {
    match value {
        DynSolValue::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Parse the extensions JSON object. Empty input is an empty map; anything
/// that is not a flat string object is `None`.
fn parse_extensions(raw: &str) -> Option<BTreeMap<String, String>> {
    if raw.trim().is_empty() {
        return Some(BTreeMap::new());
    }
    serde_json::from_str(raw).ok()
}

/// Shared decoding for the `LogWeEvent` layouts.
///
/// `content_type` is the ABI type of the fourth parameter.
fn decode_we_event(
    receipt: &TransactionReceipt,
    version: SchemaVersion,
    event_fingerprint: &str,
    content_type: DynSolType,
) -> Option<DecodedEvent> {
    if !receipt.is_success() {
        return None;
    }

    let layout = DynSolType::Tuple(vec![
        DynSolType::String,
        DynSolType::Uint(256),
        DynSolType::Uint(256),
        content_type,
        DynSolType::String,
    ]);

    let (log, raw) = receipt.logs.iter().find_map(|log| {
        if fingerprint::from_topics(&log.topics).as_deref() != Some(event_fingerprint) {
            return None;
        }
        decode_log_data(log, &layout).map(|raw| (log, raw))
    })?;

    let extensions = parse_extensions(&raw.extensions)?;
    Some(DecodedEvent {
        event_id: event_id(&raw.topic, raw.event_seq, raw.event_block),
        topic: raw.topic,
        content: raw.content,
        extensions,
        event_seq: raw.event_seq,
        schema_version: version,
        contract_address: receipt.recipient().unwrap_or(log.address.as_str()).to_string(),
        tx_hash: receipt.transaction_hash.clone(),
        block_number: receipt.block_number,
    })
}

fn decode_log_data(log: &ReceiptLog, layout: &DynSolType) -> Option<RawWeEvent> {
    let hex = log.data.strip_prefix("0x").unwrap_or(&log.data);
    let bytes = hex::decode(hex).ok()?;
    let values = match layout.abi_decode_params(&bytes).ok()? {
        DynSolValue::Tuple(values) => values,
        _ => return None,
    };
    let [topic, seq, block, content, extensions] = values.as_slice() else {
        return None;
    };

    let content = match content {
        DynSolValue::String(s) => s.clone().into_bytes(),
        DynSolValue::Bytes(b) => b.clone(),
        _ => return None,
    };

    Some(RawWeEvent {
        topic: as_string(topic)?,
        event_seq: as_u64(seq)?,
        event_block: as_u64(block)?,
        content,
        extensions: as_string(extensions)?,
    })
}

// ─── Version decoders ────────────────────────────────────────────────────────

/// Schema version 1 decoder.
#[derive(Debug, Clone)]
pub struct V1Decoder {
    fingerprint: String,
}

impl V1Decoder {
    pub fn new() -> Self {
        Self {
            fingerprint: fingerprint::keccak256_signature(V1_SIGNATURE),
        }
    }
}

impl Default for V1Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDecoder for V1Decoder {
    fn version(&self) -> SchemaVersion {
        SchemaVersion::V1
    }

    fn signature(&self) -> &str {
        V1_SIGNATURE
    }

    fn decode(&self, receipt: &TransactionReceipt) -> Option<DecodedEvent> {
        decode_we_event(
            receipt,
            SchemaVersion::V1,
            &self.fingerprint,
            DynSolType::String,
        )
    }
}

/// Schema version 2 decoder.
#[derive(Debug, Clone)]
pub struct V2Decoder {
    fingerprint: String,
}

impl V2Decoder {
    pub fn new() -> Self {
        Self {
            fingerprint: fingerprint::keccak256_signature(V2_SIGNATURE),
        }
    }
}

impl Default for V2Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDecoder for V2Decoder {
    fn version(&self) -> SchemaVersion {
        SchemaVersion::V2
    }

    fn signature(&self) -> &str {
        V2_SIGNATURE
    }

    fn decode(&self, receipt: &TransactionReceipt) -> Option<DecodedEvent> {
        decode_we_event(
            receipt,
            SchemaVersion::V2,
            &self.fingerprint,
            DynSolType::Bytes,
        )
    }
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

/// Decoders keyed by schema version.
pub struct DecoderSet {
    decoders: HashMap<SchemaVersion, Box<dyn EventDecoder>>,
}

impl DecoderSet {
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Every version this build understands.
    pub fn standard() -> Self {
        Self::empty()
            .with(Box::new(V1Decoder::new()))
            .with(Box::new(V2Decoder::new()))
    }

    pub fn with(mut self, decoder: Box<dyn EventDecoder>) -> Self {
        self.decoders.insert(decoder.version(), decoder);
        self
    }

    pub fn supports(&self, version: SchemaVersion) -> bool {
        self.decoders.contains_key(&version)
    }

    pub fn versions(&self) -> Vec<SchemaVersion> {
        let mut v: Vec<_> = self.decoders.keys().copied().collect();
        v.sort();
        v
    }

    /// Decode with the decoder for `version`. An unsupported version is a
    /// non-match.
    pub fn decode(
        &self,
        receipt: &TransactionReceipt,
        version: SchemaVersion,
    ) -> Option<DecodedEvent> {
        self.decoders.get(&version)?.decode(receipt)
    }
}

impl Default for DecoderSet {
    fn default() -> Self {
        Self::standard()
    }
}
