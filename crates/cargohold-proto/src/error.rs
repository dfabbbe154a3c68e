//! Errors produced while framing or decoding packets on the wire.

use thiserror::Error;

/// Errors that can occur while encoding or decoding the wire protocol.
///
/// These are structural/format errors only - they say nothing about whether
/// an operation the packet describes (login, upload, ...) succeeded. A
/// connection that produces one of these errors is no longer trustworthy and
/// should be closed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The 4-byte length prefix claimed a size outside the allowed range.
    #[error("invalid frame length: {length} (max {max})")]
    InvalidFrameLength {
        /// Length claimed by the prefix.
        length: i64,
        /// Maximum frame size accepted by this server.
        max: usize,
    },

    /// The stream ended before a full frame (length prefix or body) arrived.
    #[error("connection closed mid-frame: expected {expected} bytes, got {actual}")]
    FrameTruncated {
        /// Bytes expected.
        expected: usize,
        /// Bytes actually read before the stream ended.
        actual: usize,
    },

    /// The protocol version byte was not a version this server understands.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// A length-prefixed string or byte field was not valid UTF-8.
    #[error("invalid utf-8 in field {field}")]
    InvalidUtf8 {
        /// Name of the field that failed to decode.
        field: &'static str,
    },

    /// A declared length would read past the end of the buffer.
    #[error("malformed packet: {0}")]
    Malformed(String),

    /// The JSON payload body did not match the shape expected for the
    /// command code it was attached to.
    #[error("invalid payload for command {command}: {reason}")]
    InvalidPayload {
        /// Command code the payload was attached to.
        command: i32,
        /// Reason the payload could not be decoded.
        reason: String,
    },
}

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
