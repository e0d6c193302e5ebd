//! # Error Definitions
//!
//! Everything that can go wrong while taking a frame apart.

/// Decoding failures of the frame and envelope layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The message carried no bytes at all, not even a discriminator.
    EmptyFrame,
    /// The payload ended before the fixed envelope header did.
    Truncated { needed: usize, found: usize },
    /// A reply carried a status byte that is neither success nor failure.
    UnknownStatus(u8),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyFrame => write!(f, "empty frame"),
            Self::Truncated { needed, found } => {
                write!(f, "truncated envelope: needed {} bytes, found {}", needed, found)
            }
            Self::UnknownStatus(status) => write!(f, "unknown reply status 0x{:02x}", status),
        }
    }
}

impl std::error::Error for Error {}

/// A specialized Result type for frame operations.
pub type Result<T> = std::result::Result<T, Error>;
