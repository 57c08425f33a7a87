//! A Chord distributed hash table node: a peer-to-peer overlay in which
//! nodes arranged on a circular identifier space collectively store
//! key/value pairs, routing lookups in O(log N) hops via a per-node finger
//! table and self-healing under joins, departures and failures via periodic
//! stabilization.

pub mod cli;
pub mod config;
pub mod error;
pub mod finger_table;
pub mod host;
pub mod key;
pub mod node;
pub mod peer;
pub mod proto;
pub mod repl;
pub mod scheduler;
pub mod store;
