//! Host-authoritative network play
//!
//! The host runs the only simulation. The client sends its input and renders
//! an interpolated copy of the host's broadcasts.

pub mod client;
pub mod host;
pub mod latency;
pub mod protocol;
pub mod transport;

pub use client::ClientSession;
pub use host::HostSession;
pub use latency::LatencyMonitor;
pub use protocol::{NetMessage, StateUpdate};
pub use transport::{LoopbackTransport, Transport, TransportError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode frame: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Encode and send, logging instead of failing
///
/// Returns `false` only when the peer is gone for good.
pub(crate) fn send_message<T: Transport>(transport: &T, message: &NetMessage) -> bool {
    let result = message
        .encode()
        .and_then(|frame| transport.send(frame).map_err(NetError::from));
    match result {
        Ok(()) => true,
        Err(NetError::Transport(TransportError::Disconnected)) => {
            log::warn!("Peer disconnected while sending {}", message.kind());
            false
        }
        Err(e) => {
            log::debug!("Dropped {}: {}", message.kind(), e);
            true
        }
    }
}

/// Decode every queued frame, dropping the ones that fail
pub(crate) fn receive_messages<T: Transport>(transport: &T) -> Vec<NetMessage> {
    transport
        .drain()
        .into_iter()
        .filter_map(|frame| match NetMessage::decode(&frame) {
            Ok(message) => Some(message),
            Err(e) => {
                log::warn!("Dropping malformed frame: {}", e);
                None
            }
        })
        .collect()
}
