//! The generic error body sent with command 301 or as the failure case of
//! any request/response pair.

use serde::{Deserialize, Serialize};

/// Body of a generic or unsolicited error response.
///
/// Carries the original request's command code so the client can correlate
/// the failure without relying on the packet id alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponseBody {
    /// Always `false` for this body; present for symmetry with success
    /// bodies so clients can branch on one field.
    #[serde(rename = "Success")]
    pub success: bool,
    /// Human-readable failure description.
    #[serde(rename = "Message")]
    pub message: String,
    /// Command code of the request that failed, when known.
    #[serde(rename = "OriginalCommand", skip_serializing_if = "Option::is_none")]
    pub original_command: Option<i32>,
}

impl ErrorResponseBody {
    /// Builds an error body for a request that failed with `message`.
    #[must_use]
    pub fn for_command(original_command: i32, message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), original_command: Some(original_command) }
    }

    /// Builds an error body with no known originating command, used when a
    /// frame could not even be decoded far enough to know its command code.
    #[must_use]
    pub fn generic(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into(), original_command: None }
    }
}
