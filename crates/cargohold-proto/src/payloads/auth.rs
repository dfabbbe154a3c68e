//! Payload bodies for the authentication commands (100-111).

use serde::{Deserialize, Serialize};

/// Body of a `LoginRequest` (command 100).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequestBody {
    /// Username, compared case-insensitively against the user store.
    #[serde(rename = "Username")]
    pub username: String,
    /// Cleartext password; verified against the stored credential.
    #[serde(rename = "Password")]
    pub password: String,
}

/// Body of a `LoginResponse` (command 101).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponseBody {
    /// Whether authentication succeeded.
    #[serde(rename = "Success")]
    pub success: bool,
    /// Human-readable status or failure reason.
    #[serde(rename = "Message")]
    pub message: String,
    /// The authenticated user's id, empty on failure.
    #[serde(rename = "UserId", skip_serializing_if = "String::is_empty", default)]
    pub user_id: String,
}

/// Body of a `CreateAccountRequest` (command 110).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountRequestBody {
    /// Desired username; must be unique case-insensitively.
    #[serde(rename = "Username")]
    pub username: String,
    /// Cleartext password to hash and store.
    #[serde(rename = "Password")]
    pub password: String,
    /// Contact email, stored but not validated by the core.
    #[serde(rename = "Email")]
    pub email: String,
}

/// Body of a `CreateAccountResponse` (command 111).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountResponseBody {
    /// Whether the account was created.
    #[serde(rename = "Success")]
    pub success: bool,
    /// Human-readable status or failure reason.
    #[serde(rename = "Message")]
    pub message: String,
}

/// Body of a `LogoutResponse` (command 103).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutResponseBody {
    /// Always `true`; logout cannot be rejected once authenticated.
    #[serde(rename = "Success")]
    pub success: bool,
    /// Human-readable status message.
    #[serde(rename = "Message")]
    pub message: String,
}
