use std::collections::HashMap;
use std::sync::Mutex;

use crate::key::Key;

/// Opaque serialisable value: the node never inspects the bytes, only moves
/// them between `store`, the wire, and the caller.
pub type Value = Vec<u8>;

/// The `Key -> Value` mapping a node holds for the keys it is currently
/// responsible for. Mutated and iterated under one lock; `handoff` snapshots
/// the key set before iterating rather than removing entries while walking
/// the map.
#[derive(Default)]
pub struct Store {
    entries: Mutex<HashMap<Key, Value>>,
}

impl Store {
    pub fn new() -> Self {
        Store::default()
    }

    pub fn get(&self, key: Key) -> Option<Value> {
        self.entries.lock().unwrap().get(&key).cloned()
    }

    /// Inserts, returning the previous binding if any.
    pub fn put(&self, key: Key, value: Value) -> Option<Value> {
        self.entries.lock().unwrap().insert(key, value)
    }

    pub fn remove(&self, key: Key) -> Option<Value> {
        self.entries.lock().unwrap().remove(&key)
    }

    /// Inserts only if absent, so repeated handoffs of the same key are
    /// idempotent.
    pub fn offer(&self, key: Key, value: Value) {
        self.entries.lock().unwrap().entry(key).or_insert(value);
    }

    /// Snapshot of the currently-held keys, for `handoff` to iterate over
    /// without holding the lock across the remote `offer` calls it makes
    /// per key.
    pub fn snapshot_keys(&self) -> Vec<Key> {
        self.entries.lock().unwrap().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_returns_previous_binding() {
        let store = Store::new();
        let k = Key::new(5, 32);
        assert_eq!(store.put(k, b"a".to_vec()), None);
        assert_eq!(store.put(k, b"b".to_vec()), Some(b"a".to_vec()));
        assert_eq!(store.get(k), Some(b"b".to_vec()));
    }

    #[test]
    fn offer_is_idempotent() {
        // offer(k,v); offer(k,v') leaves v bound.
        let store = Store::new();
        let k = Key::new(5, 32);
        store.offer(k, b"v".to_vec());
        store.offer(k, b"v-prime".to_vec());
        assert_eq!(store.get(k), Some(b"v".to_vec()));
    }

    #[test]
    fn snapshot_keys_is_independent_of_later_removals() {
        let store = Store::new();
        let k1 = Key::new(1, 32);
        let k2 = Key::new(2, 32);
        store.put(k1, b"x".to_vec());
        store.put(k2, b"y".to_vec());
        let mut keys = store.snapshot_keys();
        keys.sort();
        assert_eq!(keys, vec![k1, k2]);
        store.remove(k1);
        assert_eq!(store.len(), 1);
    }
}
