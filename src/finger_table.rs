use std::sync::Mutex;

use crate::peer::PeerHandle;

/// Per-node array of `bits` shortcuts, `finger[i]` the successor of
/// `self_key.shift(i)`. Mutated and read under one lock: `set` replaces a
/// single slot, `snapshot` clones the whole table for callers
/// (`closestPrecedingFinger`, the dev-mode summary RPC) that must scan it
/// without holding the lock across network calls.
pub struct FingerTable {
    entries: Mutex<Vec<PeerHandle>>,
}

impl FingerTable {
    /// All `bits` slots start out pointing at `initial` (self, before any
    /// join has run `fixFingers`).
    pub fn new(bits: u32, initial: PeerHandle) -> Self {
        FingerTable {
            entries: Mutex::new(vec![initial; bits as usize]),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn get(&self, index: usize) -> PeerHandle {
        self.entries.lock().unwrap()[index].clone()
    }

    pub fn set(&self, index: usize, peer: PeerHandle) {
        self.entries.lock().unwrap()[index] = peer;
    }

    /// Clones the whole table. `closestPrecedingFinger` scans this snapshot
    /// rather than the live table: the scan makes a liveness probe per
    /// candidate, an `.await` point that must not happen while holding a
    /// `std::sync::Mutex` guard.
    pub fn snapshot(&self) -> Vec<PeerHandle> {
        self.entries.lock().unwrap().clone()
    }
}
