//! Message transport
//!
//! The session logic only needs "send a text frame" and "poll for a text
//! frame". `LoopbackTransport` connects two sessions in one process over
//! `std::sync::mpsc` channels; a WebRTC data channel or WebSocket would
//! implement the same trait.

use std::sync::mpsc::{self, Receiver, Sender};

use thiserror::Error;

/// Why a frame could not be sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The peer is gone; nothing sent from now on will arrive
    #[error("peer disconnected")]
    Disconnected,
    /// Transient backpressure; the frame was dropped
    #[error("send buffer full")]
    Full,
}

/// A bidirectional, message-oriented, non-blocking link to one peer
pub trait Transport {
    /// Fire-and-forget send of one frame
    fn send(&self, frame: String) -> Result<(), TransportError>;
    /// Next received frame, if any (never blocks)
    fn try_recv(&self) -> Option<String>;

    /// All frames currently queued
    fn drain(&self) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(frame) = self.try_recv() {
            out.push(frame);
        }
        out
    }
}

/// In-process transport over a pair of unbounded channels
pub struct LoopbackTransport {
    tx: Sender<String>,
    rx: Receiver<String>,
}

impl LoopbackTransport {
    /// Two connected endpoints: what one sends, the other receives
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        (Self { tx: tx_a, rx: rx_b }, Self { tx: tx_b, rx: rx_a })
    }
}

impl Transport for LoopbackTransport {
    fn send(&self, frame: String) -> Result<(), TransportError> {
        self.tx
            .send(frame)
            .map_err(|_| TransportError::Disconnected)
    }

    fn try_recv(&self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, frame: String) -> Result<(), TransportError> {
        (**self).send(frame)
    }

    fn try_recv(&self) -> Option<String> {
        (**self).try_recv()
    }
}
