//! JSON payload bodies carried by packets.
//!
//! The wire payload for most commands is a UTF-8 JSON object with PascalCase
//! field names, matching the reference client's request/response shapes.
//! Binary chunk bytes are the exception: upload/download chunk commands
//! carry the raw bytes directly as the payload, with indices and flags
//! travelling in packet metadata instead.

pub mod auth;
pub mod directories;
pub mod error;
pub mod files;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::{ProtocolError, Result};

/// Serializes `body` to a JSON payload.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidPayload`] if `body` cannot be represented
/// as JSON, which does not happen for any type defined in this module.
pub fn encode_body<T: Serialize>(command: i32, body: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(body)
        .map_err(|err| ProtocolError::InvalidPayload { command, reason: err.to_string() })
}

/// Deserializes a JSON payload into `T`.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidPayload`] if `bytes` is not valid JSON or
/// does not match the shape of `T`.
pub fn decode_body<T: DeserializeOwned>(command: i32, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|err| ProtocolError::InvalidPayload { command, reason: err.to_string() })
}
