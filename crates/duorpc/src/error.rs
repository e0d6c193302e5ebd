//! # Error Definitions
//!
//! Failures surfaced to the application, either from a gateway operation or
//! as the resolution of one specific call.
//!
//! Anomalies that must not reach any caller (unknown discriminators, stale
//! replies, queue overflow) are [`crate::Diagnostic`]s instead.

use crate::transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No transport is bound; nothing was sent.
    NotConnected,
    /// A transport is already bound to this gateway.
    AlreadyBound,
    /// A request handler was already registered.
    HandlerAlreadyRegistered,
    /// Queued requests need a tokio runtime to be answered and none is running.
    RuntimeUnavailable,
    /// The transport refused the outbound frame.
    Transport(transport::Error),
    /// No reply arrived before the deadline.
    Timeout,
    /// The call was cancelled before a reply arrived.
    Cancelled,
    /// The connection was disposed while the call was pending.
    Teardown,
    /// The remote handler reported a failure.
    Remote(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConnected => write!(f, "No connection"),
            Self::AlreadyBound => write!(f, "Transport already bound"),
            Self::HandlerAlreadyRegistered => write!(f, "Request handler already registered"),
            Self::RuntimeUnavailable => write!(f, "No tokio runtime to answer queued requests"),
            Self::Transport(e) => write!(f, "Transport error: {}", e),
            Self::Timeout => write!(f, "Request timed out"),
            Self::Cancelled => write!(f, "Request cancelled"),
            Self::Teardown => write!(f, "Connection disposed while request was pending"),
            Self::Remote(message) => write!(f, "Remote failure: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<transport::Error> for Error {
    fn from(e: transport::Error) -> Self {
        Self::Transport(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
