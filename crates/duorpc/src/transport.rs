//! # Transport Abstraction
//!
//! A minimal, async interface for moving whole messages between two peers.
//!
//! ## Philosophy
//!
//! - **Byte-Oriented**: The Transport knows nothing about discriminators,
//!   envelopes or handlers. It moves opaque buffers.
//! - **Message-Framed**: One `send` is one message on the other side. There is
//!   no stream reassembly at this layer.
//! - **Push or Pull**: Transports that deliver through their own callback feed
//!   [`crate::Gateway::on_receive`] and never implement `recv`. Transports
//!   that are read in a loop implement `recv` and are driven by
//!   [`crate::Gateway::attach`].

use std::fmt;

/// Errors that occur at the network/transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The peer is unreachable or the connection was dropped.
    ConnectionLost(String),
    /// Generic I/O error or internal transport failure.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionLost(msg) => write!(f, "Connection lost: {}", msg),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// A duplex, message-framed channel.
///
/// This trait is designed to be object-safe (`Arc<dyn Transport>`).
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends one message.
    ///
    /// # invariants
    /// - Must not interpret the payload content.
    /// - Must return `Err` if the message could not be handed to the channel.
    async fn send(&self, payload: &[u8]) -> Result<()>;

    /// Waits for the next inbound message.
    ///
    /// Returns `Ok(None)` once the peer has closed the channel. Callback-driven
    /// transports keep the default, which reports pull-receive as unsupported.
    async fn recv(&self) -> Result<Option<Vec<u8>>> {
        Err(Error::Io("transport does not support pull-based receive".into()))
    }
}
