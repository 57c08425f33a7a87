//! Generated gRPC/protobuf bindings: `build.rs` compiles `proto/chord.proto`
//! via `tonic-build`; this module just re-exports the result and the small
//! set of domain <-> wire conversions every RPC path needs.

use crate::host::Host;
use crate::key::Key;

tonic::include_proto!("chord");

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("chord_descriptor");

impl From<Key> for KeyMsg {
    fn from(key: Key) -> Self {
        KeyMsg {
            value: key.value(),
            bits: key.bits(),
        }
    }
}

impl From<KeyMsg> for Key {
    fn from(msg: KeyMsg) -> Self {
        Key::new(msg.value, msg.bits)
    }
}

impl From<&Host> for StubMsg {
    fn from(host: &Host) -> Self {
        StubMsg {
            address: host.address.clone(),
            port: host.port as u32,
        }
    }
}

impl From<Host> for StubMsg {
    fn from(host: Host) -> Self {
        StubMsg::from(&host)
    }
}

impl From<StubMsg> for Host {
    fn from(msg: StubMsg) -> Self {
        Host::new(msg.address, msg.port as u16)
    }
}
