use std::fmt::Debug;
use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::error::NodeError;
use crate::host::Host;
use crate::key::Key;
use crate::node::NodeCore;
use crate::store::Value;

/// A reference to another node, local or remote. Every operation may fail
/// with `NodeError::Unreachable` at any time; callers must treat that as
/// "peer dead" and fall back structurally rather than retry.
///
/// Modelled as a trait with two concrete variants: `LocalNode` short-circuits
/// straight into the in-process `NodeCore`, `RemoteHandle` dispatches over
/// gRPC. Callers never need to know which one they're holding.
#[async_trait]
pub trait Peer: Send + Sync + Debug {
    fn host(&self) -> &Host;

    async fn key(&self) -> Result<Key, NodeError>;
    async fn successor(&self) -> Result<PeerHandle, NodeError>;
    async fn successors(&self) -> Result<Vec<PeerHandle>, NodeError>;
    async fn predecessor(&self) -> Result<Option<PeerHandle>, NodeError>;
    async fn find_successor(&self, id: Key) -> Result<PeerHandle, NodeError>;
    async fn notify(&self, candidate: PeerHandle) -> Result<(), NodeError>;
    async fn get(&self, key: Key) -> Result<Option<Value>, NodeError>;
    async fn put(&self, key: Key, value: Value) -> Result<Option<Value>, NodeError>;
    async fn offer(&self, key: Key, value: Value) -> Result<(), NodeError>;
}

pub type PeerHandle = Arc<dyn Peer>;

/// The in-process variant of `Peer`: every call reaches straight into
/// `NodeCore` without touching the network.
///
/// Holds a `Weak` reference rather than an `Arc`: `NodeCore` stores its own
/// `LocalNode` handle in `finger[0]`/`successors` at start-up, and a strong
/// reference there would form an uncollectable `Arc` cycle.
#[derive(Clone)]
pub struct LocalNode {
    pub(crate) inner: Weak<NodeCore>,
    pub(crate) host: Host,
}

impl LocalNode {
    /// Built from a `Weak` handed out by `Arc::new_cyclic` during
    /// `NodeCore::new`: at that point no `Arc<NodeCore>` exists yet to
    /// downgrade from.
    pub fn new(inner: Weak<NodeCore>, host: Host) -> Self {
        LocalNode { inner, host }
    }

    fn upgrade(&self) -> Result<Arc<NodeCore>, NodeError> {
        self.inner
            .upgrade()
            .ok_or_else(|| NodeError::Unreachable("local node has shut down".into()))
    }
}

impl Debug for LocalNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalNode({})", self.host)
    }
}

#[async_trait]
impl Peer for LocalNode {
    fn host(&self) -> &Host {
        &self.host
    }

    async fn key(&self) -> Result<Key, NodeError> {
        Ok(self.upgrade()?.self_key())
    }

    async fn successor(&self) -> Result<PeerHandle, NodeError> {
        self.upgrade()?.successor().await
    }

    async fn successors(&self) -> Result<Vec<PeerHandle>, NodeError> {
        Ok(self.upgrade()?.successor_list_snapshot())
    }

    async fn predecessor(&self) -> Result<Option<PeerHandle>, NodeError> {
        self.upgrade()?.predecessor().await
    }

    async fn find_successor(&self, id: Key) -> Result<PeerHandle, NodeError> {
        self.upgrade()?.find_successor(id).await
    }

    async fn notify(&self, candidate: PeerHandle) -> Result<(), NodeError> {
        self.upgrade()?.notify(candidate).await;
        Ok(())
    }

    async fn get(&self, key: Key) -> Result<Option<Value>, NodeError> {
        Ok(self.upgrade()?.get_local(key))
    }

    async fn put(&self, key: Key, value: Value) -> Result<Option<Value>, NodeError> {
        Ok(self.upgrade()?.put_local(key, value))
    }

    async fn offer(&self, key: Key, value: Value) -> Result<(), NodeError> {
        self.upgrade()?.offer_local(key, value);
        Ok(())
    }
}
