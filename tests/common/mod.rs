//! Shared harness for multi-node end-to-end scenarios: spins up real
//! `NodeCore`s with live gRPC services on loopback sockets (no mocked
//! transport). Fixtures land nodes at chosen keys by picking loopback ports
//! whose `blake3`-derived key lands where the scenario wants it, rather than
//! stubbing the hash function.

use std::sync::Arc;
use std::time::Duration;

use chord::config::Config;
use chord::host::Host;
use chord::node::remote::RemoteHandle;
use chord::node::service::ChordService;
use chord::node::NodeCore;
use chord::proto::chord_server::ChordServer;
use tokio::task::JoinHandle;
use tonic::transport::Server;

pub struct RunningNode {
    pub core: Arc<NodeCore>,
    grpc_task: JoinHandle<()>,
    bootstrap_task: JoinHandle<()>,
}

impl RunningNode {
    /// Aborts the node's gRPC and bootstrap listeners, simulating an
    /// unreachable peer without an explicit leave protocol.
    pub fn kill(&self) {
        self.grpc_task.abort();
        self.bootstrap_task.abort();
    }
}

/// A small ring-width test config: shorter timeouts so scenarios don't need
/// to wait out the production 4s stabilization interval.
pub fn test_config(key_bits: u32) -> Config {
    Config {
        key_bits,
        stabilize_interval: Duration::from_millis(50),
        successor_list_size: 2,
        liveness_timeout: Duration::from_millis(200),
        dev_mode: true,
    }
}

/// Starts a node bound to `127.0.0.1:<port>` and returns it once its gRPC
/// and bootstrap listeners are both accepting connections.
pub async fn spawn_node(port: u16, config: Config) -> RunningNode {
    let host = Host::new("127.0.0.1", port);
    let core = NodeCore::new(host.clone(), config);

    let bootstrap_host = host.clone();
    let bootstrap_task = tokio::spawn(async move {
        let _ = chord::node::bootstrap::serve(bootstrap_host).await;
    });

    let grpc_core = core.clone();
    let socket_addr: std::net::SocketAddr = format!("{}:{}", host.address, host.port).parse().unwrap();
    let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
    let grpc_task = tokio::spawn(async move {
        let service = ChordServer::new(ChordService::new(grpc_core));
        let incoming = loop {
            match tokio::net::TcpListener::bind(socket_addr).await {
                Ok(listener) => break tokio_stream::wrappers::TcpListenerStream::new(listener),
                Err(_) => tokio::time::sleep(Duration::from_millis(10)).await,
            }
        };
        ready_tx.send(()).ok();
        let _ = Server::builder()
            .add_service(service)
            .serve_with_incoming(incoming)
            .await;
    });
    ready_rx.await.ok();
    // Give the listener a moment to actually start accepting (serve_with_incoming
    // begins polling just after this point).
    tokio::time::sleep(Duration::from_millis(20)).await;

    RunningNode {
        core,
        grpc_task,
        bootstrap_task,
    }
}

pub fn remote_of(node: &RunningNode) -> Arc<RemoteHandle> {
    Arc::new(RemoteHandle::new(node.core.host().clone()))
}

pub async fn stabilize_n(node: &RunningNode, rounds: u32) {
    for _ in 0..rounds {
        let _ = node.core.stabilize().await;
    }
}
