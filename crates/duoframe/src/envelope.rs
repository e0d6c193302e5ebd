//! # Call Envelope
//!
//! Defines how a call's sequence number travels inside the frame payload.
//!
//! ## Wire Format
//! - Call:  `seq: u64 (big-endian)` ++ `body`
//! - Reply: `seq: u64 (big-endian)` ++ `status: u8` ++ `body`
//!   - `0x00`: success, `body` is the handler's result bytes
//!   - `0x01`: failure, `body` is a UTF-8 message
//!
//! ## Invariants
//! - `body` is never inspected; it round-trips byte-for-byte.
//! - All decoding paths return `Result`, never panicking on short input.

use crate::error::Error;
use crate::error::Result;

const SEQ_LEN: usize = 8;
const REPLY_HEADER_LEN: usize = SEQ_LEN + 1;

const STATUS_OK: u8 = 0x00;
const STATUS_ERR: u8 = 0x01;

/// Encodes an outbound call payload.
pub struct CallEncoder<'a> {
    pub seq: u64,
    pub body: &'a [u8],
}

impl<'a> CallEncoder<'a> {
    pub fn new(seq: u64, body: &'a [u8]) -> Self {
        Self { seq, body }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SEQ_LEN + self.body.len());
        out.extend_from_slice(&self.seq.to_be_bytes());
        out.extend_from_slice(self.body);
        out
    }
}

/// Decodes an inbound call payload.
#[derive(Debug, PartialEq, Eq)]
pub struct CallDecoder<'a> {
    pub seq: u64,
    pub body: &'a [u8],
}

impl<'a> CallDecoder<'a> {
    pub fn decode(bytes: &'a [u8]) -> Result<Self> {
        let seq = read_seq(bytes)?;
        Ok(Self { seq, body: &bytes[SEQ_LEN..] })
    }
}

/// Encodes a successful reply.
pub struct ReplyOkEncoder<'a> {
    pub seq: u64,
    pub body: &'a [u8],
}

impl<'a> ReplyOkEncoder<'a> {
    pub fn new(seq: u64, body: &'a [u8]) -> Self {
        Self { seq, body }
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_reply(self.seq, STATUS_OK, self.body)
    }
}

/// Encodes a failed reply.
pub struct ReplyErrEncoder<'a> {
    pub seq: u64,
    pub message: &'a str,
}

impl<'a> ReplyErrEncoder<'a> {
    pub fn new(seq: u64, message: &'a str) -> Self {
        Self { seq, message }
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_reply(self.seq, STATUS_ERR, self.message.as_bytes())
    }
}

/// Decodes an inbound reply.
#[derive(Debug, PartialEq, Eq)]
pub struct ReplyDecoder<'a> {
    pub seq: u64,
    /// - `Ok(body)`: the remote handler's result.
    /// - `Err(message)`: the remote handler failed.
    pub status: std::result::Result<&'a [u8], String>,
}

impl<'a> ReplyDecoder<'a> {
    pub fn decode(bytes: &'a [u8]) -> Result<Self> {
        let seq = read_seq(bytes)?;
        if bytes.len() < REPLY_HEADER_LEN {
            return Err(Error::Truncated { needed: REPLY_HEADER_LEN, found: bytes.len() });
        }

        let body = &bytes[REPLY_HEADER_LEN..];
        let status = match bytes[SEQ_LEN] {
            STATUS_OK => Ok(body),
            STATUS_ERR => Err(String::from_utf8_lossy(body).into_owned()),
            other => return Err(Error::UnknownStatus(other)),
        };

        Ok(Self { seq, status })
    }
}

/// Decodes just the sequence number from a call or reply payload.
/// Useful for logging a frame whose body is otherwise malformed.
pub fn decode_seq(bytes: &[u8]) -> Result<u64> {
    read_seq(bytes)
}

// Helper functions

fn encode_reply(seq: u64, status: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(REPLY_HEADER_LEN + body.len());
    out.extend_from_slice(&seq.to_be_bytes());
    out.push(status);
    out.extend_from_slice(body);
    out
}

fn read_seq(bytes: &[u8]) -> Result<u64> {
    let head: [u8; SEQ_LEN] = bytes
        .get(..SEQ_LEN)
        .and_then(|head| head.try_into().ok())
        .ok_or(Error::Truncated { needed: SEQ_LEN, found: bytes.len() })?;
    Ok(u64::from_be_bytes(head))
}
