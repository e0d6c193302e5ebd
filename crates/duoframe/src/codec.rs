//! # Frame Codec
//!
//! Tags outbound payloads with a discriminator byte and classifies inbound
//! messages by theirs.
//!
//! ## Wire Format
//! - Byte 0: discriminator (one of the four constants below)
//! - Bytes 1..: opaque payload, no length prefix (the transport delivers
//!   whole messages)
//!
//! ## Invariants
//! - The four discriminators are distinct, so one byte identifies both the
//!   sub-channel and the message kind.
//! - A role never accepts the values it sends itself.
//! - Decoding never fails on an unknown discriminator; it classifies it as
//!   [`Incoming::Unrecognized`] and leaves the decision to the caller.

use crate::error::Error;
use crate::error::Result;

/// Request issued by the initiator, answered by the acceptor.
pub const INITIATOR_REQUEST: u8 = 0x01;
/// Response from the acceptor to an initiator request.
pub const ACCEPTOR_RESPONSE: u8 = 0x02;
/// Request issued by the acceptor, answered by the initiator.
pub const ACCEPTOR_REQUEST: u8 = 0x03;
/// Response from the initiator to an acceptor request.
pub const INITIATOR_RESPONSE: u8 = 0x04;

/// Which of the two symmetric positions a node holds on a connection.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Acceptor,
}

impl Role {
    /// The role of the node on the other end of the connection.
    pub fn peer(self) -> Self {
        match self {
            Self::Initiator => Self::Acceptor,
            Self::Acceptor => Self::Initiator,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initiator => write!(f, "initiator"),
            Self::Acceptor => write!(f, "acceptor"),
        }
    }
}

/// Outbound message kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    Request,
    Response,
}

/// A classified inbound frame. Payloads borrow from the received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incoming<'a> {
    /// The peer is calling us.
    Request(&'a [u8]),
    /// The peer is answering one of our calls.
    Response(&'a [u8]),
    /// A discriminator this role does not accept.
    Unrecognized { discriminator: u8, len: usize },
}

/// Role-parameterized frame codec.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FrameCodec {
    role: Role,
}

impl FrameCodec {
    pub fn new(role: Role) -> Self {
        Self { role }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The discriminator this role writes for an outbound frame of `kind`.
    pub fn outbound(&self, kind: Kind) -> u8 {
        match (self.role, kind) {
            (Role::Initiator, Kind::Request) => INITIATOR_REQUEST,
            (Role::Initiator, Kind::Response) => INITIATOR_RESPONSE,
            (Role::Acceptor, Kind::Request) => ACCEPTOR_REQUEST,
            (Role::Acceptor, Kind::Response) => ACCEPTOR_RESPONSE,
        }
    }

    /// Prepends the discriminator for `kind` to `payload`.
    pub fn encode(&self, kind: Kind, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(payload.len() + 1);
        frame.push(self.outbound(kind));
        frame.extend_from_slice(payload);
        frame
    }

    /// Strips the discriminator and classifies the frame.
    ///
    /// Returns `Error::EmptyFrame` only when there is no discriminator to
    /// look at.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Incoming<'a>> {
        let (&discriminator, payload) = bytes.split_first().ok_or(Error::EmptyFrame)?;
        let peer = FrameCodec::new(self.role.peer());

        let incoming = if discriminator == peer.outbound(Kind::Request) {
            Incoming::Request(payload)
        } else if discriminator == peer.outbound(Kind::Response) {
            Incoming::Response(payload)
        } else {
            Incoming::Unrecognized { discriminator, len: payload.len() }
        };

        Ok(incoming)
    }
}
