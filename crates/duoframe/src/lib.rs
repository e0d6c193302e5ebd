//! # DuoFrame
//!
//! The wire layer for a two-sided RPC connection.
//!
//! ## Architecture
//!
//! One duplex, message-framed channel carries two independent conversations:
//! requests issued by the initiator (answered by the acceptor) and requests
//! issued by the acceptor (answered by the initiator). Every message starts
//! with a single discriminator byte naming its sub-channel and kind, so a
//! node can route a frame without looking at the payload.
//!
//! - [`codec`] tags and classifies frames for a given [`Role`].
//! - [`envelope`] embeds the call sequence number (and, for replies, the
//!   success marker) inside the frame payload.
//!
//! Nothing here allocates ids, owns a connection, or blocks.

pub mod codec;
pub mod envelope;
pub mod error;

pub use codec::FrameCodec;
pub use codec::Incoming;
pub use codec::Kind;
pub use codec::Role;
pub use codec::ACCEPTOR_REQUEST;
pub use codec::ACCEPTOR_RESPONSE;
pub use codec::INITIATOR_REQUEST;
pub use codec::INITIATOR_RESPONSE;
pub use envelope::decode_seq;
pub use envelope::CallDecoder;
pub use envelope::CallEncoder;
pub use envelope::ReplyDecoder;
pub use envelope::ReplyErrEncoder;
pub use envelope::ReplyOkEncoder;
pub use error::Error;
pub use error::Result;

#[cfg(test)]
mod tests;
