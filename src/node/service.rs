use std::sync::Arc;

use tonic::{Request, Response, Status};

use crate::host::Host;
use crate::node::remote::RemoteHandle;
use crate::node::NodeCore;
use crate::peer::PeerHandle;
use crate::proto;
use crate::proto::chord_server::Chord;

/// Wraps an `Arc<NodeCore>` as the server side of remote invocation: every
/// RPC is a thin conversion between wire messages and a `NodeCore` call.
pub struct ChordService {
    node: Arc<NodeCore>,
}

impl ChordService {
    pub fn new(node: Arc<NodeCore>) -> Self {
        ChordService { node }
    }

    /// Resolves a `StubMsg` to a `PeerHandle`: the local node's own handle
    /// when the host matches self, otherwise a fresh `RemoteHandle`. This
    /// is what lets `notify` recognize and ignore a peer claiming to be
    /// itself.
    fn resolve(&self, host: Host) -> PeerHandle {
        if &host == self.node.host() {
            self.node.local_peer()
        } else {
            Arc::new(RemoteHandle::new(host))
        }
    }
}

fn missing(field: &str) -> Status {
    Status::invalid_argument(format!("missing required field '{field}'"))
}

#[tonic::async_trait]
impl Chord for ChordService {
    async fn key(&self, _request: Request<proto::Empty>) -> Result<Response<proto::KeyMsg>, Status> {
        Ok(Response::new(self.node.self_key().into()))
    }

    async fn successor(
        &self,
        _request: Request<proto::Empty>,
    ) -> Result<Response<proto::StubMsg>, Status> {
        let successor = self.node.successor().await?;
        Ok(Response::new(successor.host().into()))
    }

    async fn successors(
        &self,
        _request: Request<proto::Empty>,
    ) -> Result<Response<proto::SuccessorsResponse>, Status> {
        let peers = self
            .node
            .successor_list_snapshot()
            .iter()
            .map(|p| p.host().into())
            .collect();
        Ok(Response::new(proto::SuccessorsResponse { peers }))
    }

    async fn predecessor(
        &self,
        _request: Request<proto::Empty>,
    ) -> Result<Response<proto::PredecessorResponse>, Status> {
        let predecessor = self.node.predecessor().await?;
        Ok(Response::new(proto::PredecessorResponse {
            peer: predecessor.map(|p| p.host().into()),
        }))
    }

    async fn find_successor(
        &self,
        request: Request<proto::FindSuccessorRequest>,
    ) -> Result<Response<proto::StubMsg>, Status> {
        let key = request
            .into_inner()
            .key
            .ok_or_else(|| missing("key"))?
            .into();
        let successor = self.node.find_successor(key).await?;
        Ok(Response::new(successor.host().into()))
    }

    async fn notify(
        &self,
        request: Request<proto::NotifyRequest>,
    ) -> Result<Response<proto::Empty>, Status> {
        let candidate_host: Host = request
            .into_inner()
            .peer
            .ok_or_else(|| missing("peer"))?
            .into();
        self.node.notify(self.resolve(candidate_host)).await;
        Ok(Response::new(proto::Empty {}))
    }

    async fn get(
        &self,
        request: Request<proto::GetRequest>,
    ) -> Result<Response<proto::GetResponse>, Status> {
        let key = request
            .into_inner()
            .key
            .ok_or_else(|| missing("key"))?
            .into();
        let value = self.node.get_local(key);
        Ok(Response::new(proto::GetResponse { value }))
    }

    async fn put(
        &self,
        request: Request<proto::PutRequest>,
    ) -> Result<Response<proto::PutResponse>, Status> {
        let request = request.into_inner();
        let key = request.key.ok_or_else(|| missing("key"))?.into();
        let previous = self.node.put_local(key, request.value);
        Ok(Response::new(proto::PutResponse { previous }))
    }

    async fn offer(
        &self,
        request: Request<proto::OfferRequest>,
    ) -> Result<Response<proto::Empty>, Status> {
        let request = request.into_inner();
        let key = request.key.ok_or_else(|| missing("key"))?.into();
        self.node.offer_local(key, request.value);
        Ok(Response::new(proto::Empty {}))
    }

    async fn node_summary(
        &self,
        _request: Request<proto::Empty>,
    ) -> Result<Response<proto::NodeSummaryResponse>, Status> {
        if !self.node.config().dev_mode {
            return Err(Status::unimplemented(
                "dev-mode diagnostic RPCs are disabled on this node",
            ));
        }
        Ok(Response::new(proto::NodeSummaryResponse {
            address: Some(self.node.host().into()),
            key: Some(self.node.self_key().into()),
            predecessor: self.node.predecessor_snapshot().map(|p| p.host().into()),
            fingers: self
                .node
                .finger_snapshot()
                .iter()
                .map(|p| p.host().into())
                .collect(),
            successors: self
                .node
                .successor_list_snapshot()
                .iter()
                .map(|p| p.host().into())
                .collect(),
            store_size: self.node.store_len() as u32,
        }))
    }
}
