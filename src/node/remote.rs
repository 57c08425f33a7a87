use std::fmt;

use async_trait::async_trait;
use tonic::Request;

use crate::error::NodeError;
use crate::host::Host;
use crate::key::Key;
use crate::peer::{Peer, PeerHandle};
use crate::proto;
use crate::proto::chord_client::ChordClient;
use crate::store::Value;

/// The networked variant of `Peer`. Holds only a `Host`; every call dials a
/// fresh `tonic::transport::Channel` and drops it once the call completes,
/// rather than keeping a connection alive between invocations.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RemoteHandle {
    host: Host,
}

impl RemoteHandle {
    pub fn new(host: Host) -> Self {
        RemoteHandle { host }
    }

    async fn connect(&self) -> Result<ChordClient<tonic::transport::Channel>, NodeError> {
        ChordClient::connect(self.host.grpc_authority())
            .await
            .map_err(NodeError::from)
    }
}

impl fmt::Debug for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemoteHandle({})", self.host)
    }
}

#[async_trait]
impl Peer for RemoteHandle {
    fn host(&self) -> &Host {
        &self.host
    }

    async fn key(&self) -> Result<Key, NodeError> {
        let mut client = self.connect().await?;
        let msg = client.key(Request::new(proto::Empty {})).await?.into_inner();
        Ok(msg.into())
    }

    async fn successor(&self) -> Result<PeerHandle, NodeError> {
        let mut client = self.connect().await?;
        let msg = client
            .successor(Request::new(proto::Empty {}))
            .await?
            .into_inner();
        Ok(std::sync::Arc::new(RemoteHandle::new(msg.into())))
    }

    async fn successors(&self) -> Result<Vec<PeerHandle>, NodeError> {
        let mut client = self.connect().await?;
        let msg = client
            .successors(Request::new(proto::Empty {}))
            .await?
            .into_inner();
        Ok(msg
            .peers
            .into_iter()
            .map(|p| std::sync::Arc::new(RemoteHandle::new(p.into())) as PeerHandle)
            .collect())
    }

    async fn predecessor(&self) -> Result<Option<PeerHandle>, NodeError> {
        let mut client = self.connect().await?;
        let msg = client
            .predecessor(Request::new(proto::Empty {}))
            .await?
            .into_inner();
        Ok(msg
            .peer
            .map(|p| std::sync::Arc::new(RemoteHandle::new(p.into())) as PeerHandle))
    }

    async fn find_successor(&self, id: Key) -> Result<PeerHandle, NodeError> {
        let mut client = self.connect().await?;
        let msg = client
            .find_successor(Request::new(proto::FindSuccessorRequest {
                key: Some(id.into()),
            }))
            .await?
            .into_inner();
        Ok(std::sync::Arc::new(RemoteHandle::new(msg.into())))
    }

    async fn notify(&self, candidate: PeerHandle) -> Result<(), NodeError> {
        let mut client = self.connect().await?;
        client
            .notify(Request::new(proto::NotifyRequest {
                peer: Some(candidate.host().into()),
            }))
            .await?;
        Ok(())
    }

    async fn get(&self, key: Key) -> Result<Option<Value>, NodeError> {
        let mut client = self.connect().await?;
        let msg = client
            .get(Request::new(proto::GetRequest { key: Some(key.into()) }))
            .await?
            .into_inner();
        Ok(msg.value)
    }

    async fn put(&self, key: Key, value: Value) -> Result<Option<Value>, NodeError> {
        let mut client = self.connect().await?;
        let msg = client
            .put(Request::new(proto::PutRequest {
                key: Some(key.into()),
                value,
            }))
            .await?
            .into_inner();
        Ok(msg.previous)
    }

    async fn offer(&self, key: Key, value: Value) -> Result<(), NodeError> {
        let mut client = self.connect().await?;
        client
            .offer(Request::new(proto::OfferRequest {
                key: Some(key.into()),
                value,
            }))
            .await?;
        Ok(())
    }
}
