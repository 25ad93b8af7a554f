//! chainbroker-scanner: turns chain blocks into broker events.
//!
//! - [`BlockScanner`]: scans one block at a time, returning events, a retry
//!   signal or a hard failure
//! - [`EventDecoder`]: one implementation per schema version, dispatched
//!   through [`DecoderSet`]
//! - [`ChainExplorer`]: block, transaction and node listings for operators

pub mod decoder;
pub mod explorer;
pub mod fingerprint;
pub mod scanner;

pub use decoder::{DecoderSet, EventDecoder, V1Decoder, V2Decoder};
pub use explorer::{ChainExplorer, ChainQuery};
pub use scanner::{BlockScanner, ScanOutcome};
