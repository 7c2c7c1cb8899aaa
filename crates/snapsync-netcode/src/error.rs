//! Error types for snapsync-netcode

use crate::scheduler::TickHandle;
use snapsync_core::ObjectId;
use thiserror::Error;

/// Decode-time failures for the binary wire format
///
/// Each one is fatal to the single message being decoded only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedMessage {
    /// Buffer shorter than the kind-length header
    #[error("buffer of {len} bytes is too short for the kind header")]
    TruncatedHeader { len: usize },

    /// Declared kind length runs past the end of the buffer
    #[error("kind length {declared} exceeds the {remaining} bytes remaining")]
    KindLengthOverrun { declared: usize, remaining: usize },

    /// Kind bytes are not valid UTF-8
    #[error("kind tag is not valid UTF-8")]
    InvalidKindText,

    /// Bytes left over that do not form a whole record
    #[error("{remaining} trailing bytes at offset {offset} do not form a whole record")]
    TruncatedRecord { offset: usize, remaining: usize },
}

/// Netcode error type
#[derive(Debug, Error)]
pub enum Error {
    /// Binary message could not be decoded
    #[error("Malformed message: {0}")]
    MalformedMessage(#[from] MalformedMessage),

    /// Text envelope is not valid JSON for its type
    #[error("Envelope error: {0}")]
    Envelope(#[from] serde_json::Error),

    /// Text envelope parsed but carries invalid content
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// Tick delivered to an interpolator that is gone or not waiting for it
    #[error("Stale tick {handle} for {id}")]
    StaleTick { id: ObjectId, handle: TickHandle },

    /// Configuration rejected by validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Result type for netcode operations
pub type Result<T> = std::result::Result<T, Error>;
