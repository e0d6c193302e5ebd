//! In-process duplex transport.
//!
//! Connects two gateways in the same process through tokio mpsc channels.
//! Used by the test suite and handy for wiring components without a network.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::transport;
use crate::transport::Transport;

/// A duplex channel transport using tokio mpsc channels.
///
/// Messages sent via `send()` appear on the peer's `recv()` and vice versa.
/// Closing either end makes the peer's `recv()` return `None`.
pub struct MemoryTransport {
    tx: Mutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>>,
}

impl MemoryTransport {
    /// Creates a pair of transports connected to each other.
    ///
    /// Messages sent on `a` are received by `b` and vice versa.
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();

        let a = Self {
            tx: Mutex::new(Some(tx_a)),
            rx: Arc::new(tokio::sync::Mutex::new(rx_b)),
        };

        let b = Self {
            tx: Mutex::new(Some(tx_b)),
            rx: Arc::new(tokio::sync::Mutex::new(rx_a)),
        };

        (a, b)
    }

    /// Closes the outbound half. The peer sees end of stream once it has
    /// drained what was already sent.
    pub fn close(&self) {
        self.tx.lock().take();
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, payload: &[u8]) -> transport::Result<()> {
        let tx = self.tx.lock();
        let Some(tx) = tx.as_ref() else {
            return Err(transport::Error::ConnectionLost("Channel closed locally".into()));
        };
        tx.send(payload.to_vec())
            .map_err(|_| transport::Error::ConnectionLost("Channel closed".into()))
    }

    async fn recv(&self) -> transport::Result<Option<Vec<u8>>> {
        let mut rx = self.rx.lock().await;
        Ok(rx.recv().await)
    }
}
