//! The bootstrap stub handshake, a lower-level concern than the steady-state
//! gRPC surface: a raw TCP listener that, on every inbound connection,
//! writes a single framed `Host` (the node's own gRPC address) and closes
//! the socket. `connect` is the client half: dial, read one frame, close,
//! hand the caller a `Host` to wrap in a `RemoteHandle`.
//!
//! Framed with `tokio_util::codec::LengthDelimitedCodec` and `bincode`
//! rather than gRPC, since this handshake predates knowing which gRPC
//! method table the peer even speaks.

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::error::NodeError;
use crate::host::Host;

/// Runs the bootstrap listener forever. Call this on a dedicated task; it
/// never returns except on a fatal bind error.
pub async fn serve(host: Host) -> Result<(), NodeError> {
    let bind_addr = format!("{}:{}", host.address, host.bootstrap_port());
    let listener = TcpListener::bind(&bind_addr).await?;
    log::info!("bootstrap stub listener on {}", bind_addr);
    loop {
        let (socket, peer_addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("bootstrap listener: accept failed: {}", e);
                continue;
            }
        };
        let stub = host.clone();
        tokio::spawn(async move {
            if let Err(e) = send_stub(socket, &stub).await {
                log::debug!("bootstrap handshake with {} failed: {}", peer_addr, e);
            }
        });
    }
}

async fn send_stub(socket: TcpStream, stub: &Host) -> Result<(), NodeError> {
    let mut framed = Framed::new(socket, LengthDelimitedCodec::new());
    let bytes = bincode::serialize(stub)?;
    framed.send(bytes.into()).await?;
    Ok(())
}

/// Dials a known peer's bootstrap port, reads the one stub frame it sends,
/// and returns the `Host` it advertises for its gRPC service.
pub async fn connect(known_peer: &Host) -> Result<Host, NodeError> {
    let addr = format!("{}:{}", known_peer.address, known_peer.bootstrap_port());
    let socket = TcpStream::connect(&addr).await?;
    let mut framed = Framed::new(socket, LengthDelimitedCodec::new());
    let frame = framed
        .next()
        .await
        .ok_or_else(|| NodeError::Protocol("bootstrap peer closed without sending a stub".into()))??;
    let stub: Host = bincode::deserialize(&frame)?;
    Ok(stub)
}
