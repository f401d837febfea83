//! Codec error types shared by record and snapshot encoding.

use thiserror::Error;

/// Errors raised while encoding or decoding stored bytes.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serialization failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Deserialization failed
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Invalid magic bytes
    #[error("Invalid format: expected magic {expected:?}")]
    InvalidFormat {
        /// Expected magic bytes
        expected: [u8; 4],
    },

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Actual version found
        actual: String,
    },
}

/// Result type alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
