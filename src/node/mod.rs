pub mod bootstrap;
pub mod remote;
pub mod service;

use std::sync::{Arc, Mutex, Weak};

use crate::config::Config;
use crate::error::NodeError;
use crate::finger_table::FingerTable;
use crate::host::Host;
use crate::key::Key;
use crate::peer::{LocalNode, Peer, PeerHandle};
use crate::store::{Store, Value};

/// The ring member: finger table, successor list, predecessor, local store,
/// and the routing/stabilization algorithms. Held behind an `Arc` so the gRPC
/// service, the bootstrap listener, the scheduler, and the REPL can all share
/// one instance; `LocalNode` peer handles hold only a `Weak` back-reference
/// so the shared ownership never cycles.
pub struct NodeCore {
    host: Host,
    self_key: Key,
    config: Config,
    finger: FingerTable,
    successors: Mutex<Vec<PeerHandle>>,
    predecessor: Mutex<Option<PeerHandle>>,
    store: Store,
    self_peer: PeerHandle,
}

impl NodeCore {
    pub fn new(host: Host, config: Config) -> Arc<NodeCore> {
        let self_key = Key::from_host(&host.address, host.port, config.key_bits);
        Arc::new_cyclic(|weak: &Weak<NodeCore>| {
            let local_peer: PeerHandle = Arc::new(LocalNode::new(weak.clone(), host.clone()));
            NodeCore {
                finger: FingerTable::new(config.key_bits, local_peer.clone()),
                successors: Mutex::new(Vec::new()),
                predecessor: Mutex::new(None),
                store: Store::new(),
                self_peer: local_peer,
                host,
                self_key,
                config,
            }
        })
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn self_key(&self) -> Key {
        self.self_key
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn local_peer(&self) -> PeerHandle {
        self.self_peer.clone()
    }

    fn is_self(&self, peer: &PeerHandle) -> bool {
        peer.host() == &self.host
    }

    /// Bounded-time reachability check: `key()` under the liveness deadline.
    /// Used wherever a stale handle could otherwise poison the ring.
    async fn probe(&self, peer: &PeerHandle) -> Option<Key> {
        match tokio::time::timeout(self.config.liveness_timeout, peer.key()).await {
            Ok(Ok(key)) => Some(key),
            Ok(Err(e)) => {
                log::debug!("liveness probe: {} reported an error: {}", peer.host(), e);
                None
            }
            Err(_) => {
                log::debug!("liveness probe: {} timed out", peer.host());
                None
            }
        }
    }

    async fn is_alive(&self, peer: &PeerHandle) -> bool {
        self.probe(peer).await.is_some()
    }

    /// Scans the finger table for the closest node preceding `x`, skipping
    /// dead entries and keeping the *last* qualifying finger rather than
    /// stopping at the first.
    async fn closest_preceding_finger(&self, x: Key) -> PeerHandle {
        let mut candidate = None;
        for finger in self.finger.snapshot() {
            if let Some(finger_key) = self.probe(&finger).await {
                if finger_key != x && finger_key.is_between(self.self_key, x) {
                    candidate = Some(finger);
                }
            }
        }
        candidate.unwrap_or_else(|| self.local_peer())
    }

    /// Returns the immediate successor, promoting from the successor list
    /// on a dead `finger[0]` and falling back to self if nothing in the
    /// list is alive.
    pub async fn successor(&self) -> Result<PeerHandle, NodeError> {
        let current = self.finger.get(0);
        if self.is_alive(&current).await {
            return Ok(current);
        }
        log::warn!("successor {} is unreachable, promoting from successor list", current.host());
        let list = self.successors.lock().unwrap().clone();
        let mut promoted = None;
        for candidate in list.iter().skip(1) {
            if self.is_alive(candidate).await {
                promoted = Some(candidate.clone());
                break;
            }
        }
        let replacement = promoted.unwrap_or_else(|| self.local_peer());
        self.finger.set(0, replacement.clone());
        Ok(replacement)
    }

    /// Returns the current predecessor, clearing it first if it's no
    /// longer reachable.
    pub async fn predecessor(&self) -> Result<Option<PeerHandle>, NodeError> {
        let current = self.predecessor.lock().unwrap().clone();
        let Some(candidate) = current else {
            return Ok(None);
        };
        if self.is_alive(&candidate).await {
            return Ok(Some(candidate));
        }
        let mut guard = self.predecessor.lock().unwrap();
        if guard.as_ref().map(|p| p.host()) == Some(candidate.host()) {
            *guard = None;
        }
        Ok(guard.clone())
    }

    pub fn successor_list_snapshot(&self) -> Vec<PeerHandle> {
        self.successors.lock().unwrap().clone()
    }

    pub fn predecessor_snapshot(&self) -> Option<PeerHandle> {
        self.predecessor.lock().unwrap().clone()
    }

    pub fn finger_snapshot(&self) -> Vec<PeerHandle> {
        self.finger.snapshot()
    }

    pub fn store_len(&self) -> usize {
        self.store.len()
    }

    /// Resolves the node responsible for identifier `x`, routing the
    /// lookup through the closest preceding finger when `x` isn't between
    /// here and the immediate successor.
    pub async fn find_successor(&self, x: Key) -> Result<PeerHandle, NodeError> {
        let s = self.successor().await?;
        let s_key = s.key().await?;
        if x.is_between(self.self_key, s_key) {
            return Ok(s);
        }
        let c = self.closest_preceding_finger(x).await;
        if self.is_self(&c) {
            // Defensive: cannot make progress beyond self.
            return Ok(self.local_peer());
        }
        c.find_successor(x).await
    }

    /// Called by a node claiming it might be our predecessor; accepts it
    /// if we have none, or if it's a closer predecessor than the current
    /// one.
    pub async fn notify(&self, candidate: PeerHandle) {
        if self.is_self(&candidate) {
            return;
        }
        let candidate_key = match candidate.key().await {
            Ok(k) => k,
            Err(e) => {
                log::debug!("notify: candidate {} unreachable: {}", candidate.host(), e);
                return;
            }
        };
        let current = self.predecessor.lock().unwrap().clone();
        let accept = match &current {
            None => true,
            Some(pred) => match pred.key().await {
                Ok(pred_key) => candidate_key != self.self_key && candidate_key.is_between(pred_key, self.self_key),
                Err(_) => true,
            },
        };
        if accept {
            *self.predecessor.lock().unwrap() = Some(candidate);
        }
    }

    /// Joins the ring via a known peer: asks it to resolve our own key so
    /// `finger[0]` starts out pointing at our real successor. The
    /// predecessor stays unset until a `notify` arrives from upstream.
    pub async fn join(&self, known_peer: PeerHandle) -> Result<(), NodeError> {
        let successor = known_peer.find_successor(self.self_key).await?;
        self.finger.set(0, successor);
        Ok(())
    }

    /// Reconciles `finger[0]` against the successor's predecessor (adopting
    /// it if it's a closer fit), then notifies the successor that we might
    /// be its predecessor.
    async fn stabilize_successor_and_notify(&self) -> Result<(), NodeError> {
        let s = self.successor().await?;
        if !self.is_self(&s) {
            if let Ok(Some(c)) = s.predecessor().await {
                if let (Ok(c_key), Ok(s_key)) = (c.key().await, s.key().await) {
                    if !self.is_self(&c) && c_key != s_key && c_key.is_between(self.self_key, s_key) {
                        self.finger.set(0, c);
                    }
                }
            }
        }
        let s = self.successor().await?;
        s.notify(self.local_peer()).await.ok();
        Ok(())
    }

    /// Refreshes every finger but the immediate successor, which is kept
    /// current by stabilization itself.
    async fn fix_fingers(&self) {
        for i in 1..self.config.key_bits {
            let target = self.self_key.shift(i);
            match self.find_successor(target).await {
                Ok(peer) => self.finger.set(i as usize, peer),
                Err(e) => log::warn!("fix_fingers: could not resolve finger {}: {}", i, e),
            }
        }
    }

    /// Hands off keys this node is no longer responsible for, snapshotting
    /// the key set before iterating since `offer` calls happen mid-loop.
    async fn handoff(&self) {
        for key in self.store.snapshot_keys() {
            let responsible = match self.find_successor(key).await {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("handoff: could not resolve responsible node for {}: {}", key, e);
                    continue;
                }
            };
            if self.is_self(&responsible) {
                continue;
            }
            let Some(value) = self.store.remove(key) else {
                continue;
            };
            if let Err(e) = responsible.offer(key, value.clone()).await {
                log::warn!(
                    "handoff: offer of {} to {} failed ({}), keeping it local",
                    key,
                    responsible.host(),
                    e
                );
                self.store.offer(key, value);
            }
        }
    }

    /// Rebuilds the successor list from the current successor's own list,
    /// prepending the successor itself and truncating to the configured
    /// size.
    async fn reconcile_successors(&self) {
        let s = match self.successor().await {
            Ok(s) => s,
            Err(e) => {
                log::warn!("reconcile_successors: {}", e);
                return;
            }
        };
        if self.is_self(&s) {
            *self.successors.lock().unwrap() = Vec::new();
            return;
        }
        let mut list = s.successors().await.unwrap_or_default();
        list.insert(0, s);
        list.truncate(self.config.successor_list_size);
        *self.successors.lock().unwrap() = list;
    }

    /// One stabilization round, run by the scheduler on a fixed interval.
    pub async fn stabilize(&self) -> Result<(), NodeError> {
        self.stabilize_successor_and_notify().await?;
        self.fix_fingers().await;
        self.handoff().await;
        self.reconcile_successors().await;
        Ok(())
    }

    pub fn get_local(&self, key: Key) -> Option<Value> {
        self.store.get(key)
    }

    pub fn put_local(&self, key: Key, value: Value) -> Option<Value> {
        self.store.put(key, value)
    }

    pub fn offer_local(&self, key: Key, value: Value) {
        self.store.offer(key, value);
    }

    /// Resolves the responsible node, then serves locally or forwards.
    pub async fn get(&self, key: Key) -> Result<Option<Value>, NodeError> {
        let responsible = self.find_successor(key).await?;
        if self.is_self(&responsible) {
            Ok(self.get_local(key))
        } else {
            responsible.get(key).await
        }
    }

    /// Resolves the responsible node, then stores locally or forwards,
    /// returning the previously bound value if any.
    pub async fn put(&self, key: Key, value: Value) -> Result<Option<Value>, NodeError> {
        let responsible = self.find_successor(key).await?;
        if self.is_self(&responsible) {
            Ok(self.put_local(key, value))
        } else {
            responsible.put(key, value).await
        }
    }
}
