//! Explorer listings against an in-memory chain.

mod support;

use chainbroker_core::{BrokerError, Transaction, TransactionCount};
use chainbroker_scanner::{ChainExplorer, ChainQuery};
use support::FakeChain;

const NODE: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f90";

fn tx(hash: &str, block: u64) -> Transaction {
    Transaction {
        hash: hash.into(),
        from: "0xfrom".into(),
        to: Some("0xto".into()),
        block_number: block,
        input: "0x".into(),
    }
}

fn chain() -> FakeChain {
    let mut chain = FakeChain {
        head: Some(5),
        nodes: vec![NODE.into(), "ffff".into()],
        groups: vec!["1".into(), "2".into()],
        version: "2.9.1".into(),
        pbft_view: 77,
        tx_count: Some(TransactionCount {
            block_number: 5,
            tx_sum: 12,
            failed_tx_sum: 1,
        }),
        ..Default::default()
    };
    chain.add_block(4, &[]);
    chain.add_block(5, &["0xt1", "0xt2"]);
    chain.transactions.insert("0xt1".into(), tx("0xt1", 5));
    chain.transactions.insert("0xt2".into(), tx("0xt2", 5));
    chain
}

#[tokio::test]
async fn block_height_and_empty_head() {
    assert_eq!(ChainExplorer::new(chain()).block_height().await.unwrap(), 5);

    let silent = FakeChain::default();
    assert_eq!(ChainExplorer::new(silent).block_height().await.unwrap(), 0);

    let broken = FakeChain {
        broken: true,
        ..Default::default()
    };
    assert!(matches!(
        ChainExplorer::new(broken).block_height().await,
        Err(BrokerError::GetBlockHeight(_))
    ));
}

#[tokio::test]
async fn group_overview() {
    let general = ChainExplorer::new(chain()).group_general().await.unwrap();
    assert_eq!(general.node_count, 2);
    assert_eq!(general.latest_block, 5);
    assert_eq!(general.transaction_count, 12);
}

#[tokio::test]
async fn transaction_listings() {
    let explorer = ChainExplorer::new(chain());

    let latest = explorer.list_transactions(&ChainQuery::Latest).await.unwrap().unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].hash, "0xt1");

    let by_hash = explorer
        .list_transactions(&ChainQuery::ByHash("0xt2".into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_hash[0].block_number, 5);

    let unknown = explorer
        .list_transactions(&ChainQuery::ByHash("0xnope".into()))
        .await
        .unwrap();
    assert_eq!(unknown, Some(vec![]));

    let by_number = explorer
        .list_transactions(&ChainQuery::ByNumber(5))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_number.len(), 2);

    assert_eq!(explorer.list_transactions(&ChainQuery::ByNumber(4)).await.unwrap(), None);
    assert_eq!(explorer.list_transactions(&ChainQuery::ByNumber(99)).await.unwrap(), None);
}

#[tokio::test]
async fn block_listings() {
    let explorer = ChainExplorer::new(chain());

    let latest = explorer.list_blocks(&ChainQuery::Latest).await.unwrap().unwrap();
    assert_eq!(latest[0].number, 5);
    assert_eq!(latest[0].tx_count, 2);
    assert_eq!(latest[0].sealer_index, Some(1));
    assert!(latest[0].timestamp.is_some());

    let by_hash = explorer
        .list_blocks(&ChainQuery::ByHash("0xb4".into()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_hash[0].number, 4);

    assert_eq!(explorer.list_blocks(&ChainQuery::ByNumber(42)).await.unwrap(), None);
}

#[tokio::test]
async fn node_listing_uses_first_node() {
    let nodes = ChainExplorer::new(chain()).list_nodes().await.unwrap().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].node_id, NODE);
    assert_eq!(nodes[0].node_name, &NODE[..NODE.len() - 10]);
    assert_eq!(nodes[0].pbft_view, 77);
    assert_eq!(nodes[0].block_number, 5);
    assert!(nodes[0].active);

    let empty = FakeChain::default();
    assert_eq!(ChainExplorer::new(empty).list_nodes().await.unwrap(), None);
}

#[tokio::test]
async fn group_ids_and_version_check() {
    let explorer = ChainExplorer::new(chain());
    assert_eq!(explorer.list_group_ids().await.unwrap(), vec!["1", "2"]);
    assert_eq!(explorer.check_node_version("2.").await.unwrap(), "2.9.1");
    assert!(matches!(
        explorer.check_node_version("3.").await,
        Err(BrokerError::NodeInit(_))
    ));

    let broken = ChainExplorer::new(FakeChain {
        broken: true,
        ..Default::default()
    });
    assert!(matches!(
        broken.list_group_ids().await,
        Err(BrokerError::TransactionExecute(_))
    ));
    assert!(matches!(
        broken.list_transactions(&ChainQuery::Latest).await,
        Err(BrokerError::Web3Rpc(_))
    ));
}
