//! Round-robin failover across the nodes of one group.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};
use crate::transport::RpcTransport;

/// Round-robin node pool.
///
/// Each request starts at the next node in turn; on a retryable failure the
/// remaining nodes are tried in order before giving up with
/// [`TransportError::AllNodesDown`]. Non-retryable errors (node error
/// objects, undecodable bodies) are returned immediately.
pub struct NodePool {
    nodes: Vec<Arc<dyn RpcTransport>>,
    cursor: AtomicUsize,
}

impl NodePool {
    pub fn new(nodes: Vec<Arc<dyn RpcTransport>>) -> Self {
        Self {
            nodes,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// URLs of the pooled nodes, in configuration order.
    pub fn urls(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.url()).collect()
    }
}

#[async_trait]
impl RpcTransport for NodePool {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        if self.nodes.is_empty() {
            return Err(TransportError::AllNodesDown);
        }
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % self.nodes.len();
        for i in 0..self.nodes.len() {
            let node = &self.nodes[(start + i) % self.nodes.len()];
            match node.send(req.clone()).await {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(url = node.url(), error = %e, "node failed, trying next");
                }
                Err(e) => return Err(e),
            }
        }
        tracing::error!(nodes = self.nodes.len(), method = %req.method, "all nodes failed");
        Err(TransportError::AllNodesDown)
    }

    fn url(&self) -> &str {
        "pool"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::JsonRpcError;
    use std::sync::atomic::AtomicU32;

    enum Behaviour {
        Ok,
        Http,
        RpcError,
    }

    struct MockTransport {
        url: String,
        behaviour: Behaviour,
        calls: AtomicU32,
    }

    #[async_trait]
    impl RpcTransport for MockTransport {
        async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Ok => Ok(JsonRpcResponse {
                    jsonrpc: "2.0".into(),
                    id: req.id,
                    result: Some(serde_json::Value::String(self.url.clone())),
                    error: None,
                }),
                Behaviour::Http => Err(TransportError::Http("connection refused".into())),
                Behaviour::RpcError => Err(TransportError::Rpc(JsonRpcError {
                    code: -32000,
                    message: "bad group".into(),
                    data: None,
                })),
            }
        }
        fn url(&self) -> &str {
            &self.url
        }
    }

    fn mock(url: &str, behaviour: Behaviour) -> Arc<MockTransport> {
        Arc::new(MockTransport {
            url: url.to_string(),
            behaviour,
            calls: AtomicU32::new(0),
        })
    }

    fn node(m: &Arc<MockTransport>) -> Arc<dyn RpcTransport> {
        m.clone()
    }

    fn req() -> JsonRpcRequest {
        JsonRpcRequest::new(1, "getBlockNumber", vec![1.into()])
    }

    #[tokio::test]
    async fn round_robin_across_healthy_nodes() {
        let pool = NodePool::new(vec![
            node(&mock("a", Behaviour::Ok)),
            node(&mock("b", Behaviour::Ok)),
        ]);
        let first = pool.send(req()).await.unwrap().result.unwrap();
        let second = pool.send(req()).await.unwrap().result.unwrap();
        assert_eq!(first, "a");
        assert_eq!(second, "b");
    }

    #[tokio::test]
    async fn fails_over_to_next_node() {
        let down = mock("a", Behaviour::Http);
        let up = mock("b", Behaviour::Ok);
        let pool = NodePool::new(vec![node(&down), node(&up)]);
        let resp = pool.send(req()).await.unwrap();
        assert_eq!(resp.result.unwrap(), "b");
        assert_eq!(down.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn all_down() {
        let pool = NodePool::new(vec![
            node(&mock("a", Behaviour::Http)),
            node(&mock("b", Behaviour::Http)),
        ]);
        assert!(matches!(
            pool.send(req()).await,
            Err(TransportError::AllNodesDown)
        ));
        assert!(matches!(
            NodePool::new(vec![]).send(req()).await,
            Err(TransportError::AllNodesDown)
        ));
    }

    #[tokio::test]
    async fn rpc_error_does_not_fail_over() {
        let bad = mock("a", Behaviour::RpcError);
        let spare = mock("b", Behaviour::Ok);
        let pool = NodePool::new(vec![node(&bad), node(&spare)]);
        assert!(matches!(pool.send(req()).await, Err(TransportError::Rpc(_))));
        assert_eq!(spare.calls.load(Ordering::SeqCst), 0);
    }
}
