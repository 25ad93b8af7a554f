//! Conversion of raw JSON-RPC results into the core chain types.
//!
//! Quantities arrive as `0x`-prefixed hex strings. Some node builds return
//! plain JSON numbers for the same fields, so both are accepted.

use serde_json::Value;

use chainbroker_core::{
    BlockTransaction, ChainBlock, ClientError, ReceiptLog, Transaction, TransactionCount,
    TransactionReceipt,
};

/// Field holding the release version in the `getClientVersion` object.
pub const CLIENT_VERSION_FIELD: &str = "FISCO-BCOS Version";

/// Parse a hex quantity (`0x1a`, `1a`). `None` if it is not valid hex.
pub fn parse_hex_u64(s: &str) -> Option<u64> {
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    if s.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(s, 16).ok()
}

fn malformed(method: &str, reason: impl Into<String>) -> ClientError {
    ClientError::Malformed {
        method: method.to_string(),
        reason: reason.into(),
    }
}

/// A quantity value: hex string or JSON number.
pub fn quantity(v: &Value, method: &str) -> Result<u64, ClientError> {
    match v {
        Value::String(s) => {
            parse_hex_u64(s).ok_or_else(|| malformed(method, format!("invalid quantity {s:?}")))
        }
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| malformed(method, format!("invalid quantity {n}"))),
        other => Err(malformed(method, format!("expected quantity, got {other}"))),
    }
}

fn field_quantity(v: &Value, field: &str, method: &str) -> Result<u64, ClientError> {
    match v.get(field) {
        Some(inner) => quantity(inner, method).map_err(|e| match e {
            ClientError::Malformed { reason, .. } => malformed(method, format!("{field}: {reason}")),
            other => other,
        }),
        None => Err(malformed(method, format!("missing field {field}"))),
    }
}

fn field_str(v: &Value, field: &str, method: &str) -> Result<String, ClientError> {
    v.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed(method, format!("missing field {field}")))
}

/// Optional address field; `null`, absent and empty strings are all `None`.
fn field_opt_str(v: &Value, field: &str) -> Option<String> {
    v.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn transaction_from_json(v: &Value, method: &str) -> Result<Transaction, ClientError> {
    Ok(Transaction {
        hash: field_str(v, "hash", method)?,
        from: field_str(v, "from", method)?,
        to: field_opt_str(v, "to"),
        block_number: field_quantity(v, "blockNumber", method)?,
        input: v
            .get("input")
            .and_then(Value::as_str)
            .unwrap_or("0x")
            .to_string(),
    })
}

pub fn block_from_json(v: &Value, method: &str) -> Result<ChainBlock, ClientError> {
    let transactions = match v.get("transactions") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(hash) => Ok(BlockTransaction::Hash(hash.clone())),
                Value::Object(_) => transaction_from_json(item, method).map(BlockTransaction::Full),
                other => Err(malformed(method, format!("unexpected transaction entry {other}"))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(malformed(method, format!("transactions is not an array: {other}")))
        }
    };

    let timestamp = field_quantity(v, "timestamp", method)?;
    Ok(ChainBlock {
        number: field_quantity(v, "number", method)?,
        hash: field_str(v, "hash", method)?,
        parent_hash: v
            .get("parentHash")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        timestamp: i64::try_from(timestamp)
            .map_err(|_| malformed(method, "timestamp out of range"))?,
        sealer: v
            .get("sealer")
            .and_then(Value::as_str)
            .unwrap_or("0x0")
            .to_string(),
        transactions,
    })
}

fn log_from_json(v: &Value, method: &str) -> Result<ReceiptLog, ClientError> {
    let topics = v
        .get("topics")
        .and_then(Value::as_array)
        .map(|ts| {
            ts.iter()
                .map(|t| {
                    t.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| malformed(method, "non-string log topic"))
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?
        .unwrap_or_default();

    Ok(ReceiptLog {
        address: field_str(v, "address", method)?,
        topics,
        data: v
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or("0x")
            .to_string(),
    })
}

pub fn receipt_from_json(v: &Value, method: &str) -> Result<TransactionReceipt, ClientError> {
    let logs = match v.get("logs") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|l| log_from_json(l, method))
            .collect::<Result<Vec<_>, _>>()?,
        _ => Vec::new(),
    };

    Ok(TransactionReceipt {
        transaction_hash: field_str(v, "transactionHash", method)?,
        block_number: field_quantity(v, "blockNumber", method)?,
        from: v
            .get("from")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        to: field_opt_str(v, "to"),
        status: v
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("0x0")
            .to_string(),
        output: v
            .get("output")
            .and_then(Value::as_str)
            .unwrap_or("0x")
            .to_string(),
        logs,
    })
}

pub fn transaction_count_from_json(v: &Value, method: &str) -> Result<TransactionCount, ClientError> {
    Ok(TransactionCount {
        block_number: field_quantity(v, "blockNumber", method)?,
        tx_sum: field_quantity(v, "txSum", method)?,
        failed_tx_sum: match v.get("failedTxSum") {
            Some(inner) if !inner.is_null() => quantity(inner, method)?,
            _ => 0,
        },
    })
}

/// A JSON array of strings (node ids, group ids). Numbers are stringified.
pub fn string_list(v: &Value, method: &str) -> Result<Vec<String>, ClientError> {
    let items = v
        .as_array()
        .ok_or_else(|| malformed(method, format!("expected array, got {v}")))?;
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(malformed(method, format!("unexpected list entry {other}"))),
        })
        .collect()
}

/// The version string from a `getClientVersion` result.
///
/// 2.x nodes return an object keyed by [`CLIENT_VERSION_FIELD`]; a bare
/// string is taken as-is.
pub fn client_version_from_json(v: &Value, method: &str) -> Result<String, ClientError> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Object(_) => field_str(v, CLIENT_VERSION_FIELD, method),
        other => Err(malformed(method, format!("unexpected version payload {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_hex_u64_basic() {
        assert_eq!(parse_hex_u64("0x1"), Some(1));
        assert_eq!(parse_hex_u64("0xff"), Some(255));
        assert_eq!(parse_hex_u64("1234"), Some(0x1234));
        assert_eq!(parse_hex_u64("0x"), Some(0));
        assert_eq!(parse_hex_u64("0xzz"), None);
    }

    #[test]
    fn quantity_accepts_number_and_hex() {
        assert_eq!(quantity(&json!("0x10"), "m").unwrap(), 16);
        assert_eq!(quantity(&json!(16), "m").unwrap(), 16);
        assert!(matches!(
            quantity(&json!(true), "m"),
            Err(ClientError::Malformed { .. })
        ));
    }

    #[test]
    fn block_with_hashes() {
        let v = json!({
            "number": "0x64",
            "hash": "0xb1",
            "parentHash": "0xb0",
            "timestamp": "0x173ad8703a5",
            "sealer": "0x2",
            "transactions": ["0xt1", "0xt2"]
        });
        let block = block_from_json(&v, "getBlockByNumber").unwrap();
        assert_eq!(block.number, 100);
        assert_eq!(block.timestamp, 0x173ad8703a5);
        assert_eq!(block.sealer_index(), Some(2));
        assert_eq!(block.transaction_hashes(), vec!["0xt1", "0xt2"]);
    }

    #[test]
    fn block_with_full_transactions() {
        let v = json!({
            "number": "0x1",
            "hash": "0xb1",
            "timestamp": "0x0",
            "transactions": [
                {"hash": "0xt1", "from": "0xf", "to": null, "blockNumber": "0x1", "input": "0x"}
            ]
        });
        let block = block_from_json(&v, "getBlockByNumber").unwrap();
        let txs: Vec<_> = block.full_transactions().collect();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].to, None);
        assert_eq!(block.sealer, "0x0");
    }

    #[test]
    fn block_missing_hash_is_malformed() {
        let v = json!({"number": "0x1", "timestamp": "0x0"});
        let err = block_from_json(&v, "getBlockByNumber").unwrap_err();
        assert!(err.to_string().contains("hash"));
    }

    #[test]
    fn receipt_with_logs() {
        let v = json!({
            "transactionHash": "0xt1",
            "blockNumber": "0x5",
            "from": "0xf",
            "to": "0xc0ffee",
            "status": "0x0",
            "output": "0x",
            "logs": [{"address": "0xc0ffee", "topics": ["0xaa"], "data": "0x01"}]
        });
        let r = receipt_from_json(&v, "getTransactionReceipt").unwrap();
        assert!(r.is_success());
        assert_eq!(r.recipient(), Some("0xc0ffee"));
        assert_eq!(r.logs[0].topics, vec!["0xaa".to_string()]);
    }

    #[test]
    fn transaction_count() {
        let v = json!({"blockNumber": "0xa", "txSum": "0x14", "failedTxSum": "0x1"});
        let c = transaction_count_from_json(&v, "getTotalTransactionCount").unwrap();
        assert_eq!((c.block_number, c.tx_sum, c.failed_tx_sum), (10, 20, 1));
    }

    #[test]
    fn client_version_object() {
        let v = json!({"FISCO-BCOS Version": "2.9.1", "Build Type": "Linux/clang"});
        assert_eq!(client_version_from_json(&v, "getClientVersion").unwrap(), "2.9.1");
    }

    #[test]
    fn string_list_mixed() {
        let v = json!(["1", 2]);
        assert_eq!(string_list(&v, "getGroupList").unwrap(), vec!["1", "2"]);
    }
}
