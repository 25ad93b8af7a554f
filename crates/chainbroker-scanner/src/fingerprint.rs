//! Event signature fingerprints.
//!
//! A log's first topic is the keccak256 hash of the event's canonical
//! signature, e.g. `keccak256("LogWeEvent(string,uint256,uint256,string,string)")`.

use tiny_keccak::{Hasher, Keccak};

/// keccak256 of a canonical event signature, as lowercase `0x` hex.
pub fn keccak256_signature(signature: &str) -> String {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(signature.as_bytes());
    hasher.finalize(&mut output);
    format!("0x{}", hex::encode(output))
}

/// The signature topic of a log, lowercased.
/// `None` if there are no topics or the first one is not a 32-byte hash.
pub fn from_topics(topics: &[String]) -> Option<String> {
    let first = topics.first()?;
    let hex = first.strip_prefix("0x").unwrap_or(first);
    if hex.len() == 64 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("0x{}", hex.to_ascii_lowercase()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erc20_transfer_fingerprint() {
        assert_eq!(
            keccak256_signature("Transfer(address,address,uint256)"),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn from_topics_normalises_case() {
        let topics = vec![
            "0xDDF252AD1BE2C89B69C2B068FC378DAA952BA7F163C4A11628F55A4DF523B3EF".to_string(),
        ];
        assert_eq!(
            from_topics(&topics).as_deref(),
            Some("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
        );
    }

    #[test]
    fn from_topics_rejects_short_or_empty() {
        assert!(from_topics(&[]).is_none());
        assert!(from_topics(&["0x1234".to_string()]).is_none());
    }
}
