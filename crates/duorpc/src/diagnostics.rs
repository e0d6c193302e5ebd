//! # Diagnostic Sink
//!
//! Where protocol anomalies go when no caller should see them.
//!
//! A long-lived connection serves many independent calls, so framing-level
//! and transport-level trouble is reported here and the connection carries
//! on. Only per-call failures travel back to callers as [`crate::Error`].

use std::sync::Arc;

use parking_lot::Mutex;

/// A non-fatal anomaly observed on a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A frame's discriminator is not one this role accepts.
    UnrecognizedFrame { discriminator: u8, len: usize },
    /// A frame or its envelope could not be decoded.
    MalformedFrame { reason: duoframe::Error },
    /// A reply matched no pending call (duplicate, late, or cancelled).
    StaleResponse { seq: u64 },
    /// A request arrived before a handler was registered and the backlog was full.
    Backpressure { seq: u64, queued: usize, limit: usize },
    /// A queued request was discarded because its connection was torn down.
    RequestAbandoned { seq: u64 },
    /// A reply produced by the local handler could not be sent.
    ReplyDropped { seq: u64, error: crate::Error },
    /// The attached transport stopped delivering messages.
    TransportClosed { reason: String },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedFrame { discriminator, len } => {
                write!(f, "unrecognized frame discriminator 0x{:02x} ({} byte payload)", discriminator, len)
            }
            Self::MalformedFrame { reason } => write!(f, "malformed frame: {}", reason),
            Self::StaleResponse { seq } => write!(f, "no pending call for response seq {}", seq),
            Self::Backpressure { seq, queued, limit } => {
                write!(f, "dropped request seq {}: {} requests already queued (limit {})", seq, queued, limit)
            }
            Self::RequestAbandoned { seq } => write!(f, "request seq {} abandoned with its connection", seq),
            Self::ReplyDropped { seq, error } => write!(f, "reply for seq {} not sent: {}", seq, error),
            Self::TransportClosed { reason } => write!(f, "transport closed: {}", reason),
        }
    }
}

/// Receives diagnostics from a gateway.
pub trait DiagnosticSink: Send + Sync + 'static {
    /// `gateway` is the reporting gateway's name.
    fn report(&self, gateway: &str, diagnostic: Diagnostic);
}

/// Logs every diagnostic through `tracing`. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, gateway: &str, diagnostic: Diagnostic) {
        match &diagnostic {
            // Expected after timeouts and cancellations.
            Diagnostic::StaleResponse { seq } => {
                tracing::debug!(gateway, seq, "discarding stale response");
            }
            Diagnostic::UnrecognizedFrame { discriminator, len } => {
                tracing::warn!(gateway, discriminator, len, "unexpected frame discriminator");
            }
            _ => tracing::warn!(gateway, %diagnostic, "connection anomaly"),
        }
    }
}

/// Keeps every diagnostic in memory, in report order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything reported so far.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, gateway: &str, diagnostic: Diagnostic) {
        tracing::trace!(gateway, %diagnostic, "recorded diagnostic");
        self.records.lock().push(diagnostic);
    }
}

/// A sink paired with the name of the gateway reporting into it.
#[derive(Clone)]
pub(crate) struct Reporter {
    gateway: Arc<str>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Reporter {
    pub(crate) fn new(gateway: Arc<str>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { gateway, sink }
    }

    pub(crate) fn gateway(&self) -> &str {
        &self.gateway
    }

    pub(crate) fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(&self.gateway, diagnostic);
    }
}
