//! # DuoRPC
//!
//! Request/response RPC between two peers sharing one duplex, message-framed
//! channel. Either peer can call the other; the frames of both conversations
//! are tagged by [`duoframe`] and correlated here by call sequence number.
//!
//! Start with [`Gateway`]: bind a [`Transport`], register a handler with
//! [`Gateway::on_request`], and issue calls with [`Gateway::call`] or
//! [`Gateway::send`] + [`Gateway::await_result`].

pub mod bridge;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod pending;
pub mod transport;

pub use bridge::TransportBridge;
pub use config::GatewayConfig;
pub use config::HandlerMode;
pub use diagnostics::Diagnostic;
pub use diagnostics::DiagnosticSink;
pub use diagnostics::MemorySink;
pub use diagnostics::TracingSink;
pub use dispatch::Dispatcher;
pub use dispatch::HandlerResult;
pub use dispatch::RequestHandler;
pub use duoframe::Role;
pub use error::Error;
pub use error::Result;
pub use gateway::Gateway;
pub use gateway::GatewayBuilder;
pub use memory::MemoryTransport;
pub use pending::CallHandle;
pub use pending::FutureManager;
pub use transport::Transport;
