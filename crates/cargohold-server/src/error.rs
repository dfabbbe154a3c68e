//! Server-level errors: catalog, storage, and command-dispatch failures.
//!
//! Session-lifecycle and framing errors live in `cargohold_core::SessionError`
//! and `cargohold_proto::ProtocolError`; this module covers the kinds that
//! only make sense once catalogs and physical storage are involved.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors produced while handling a dispatched command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServerError {
    /// The referenced file or directory id does not resolve for this owner.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness or state invariant was violated (duplicate name,
    /// non-empty directory on non-recursive delete).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An upload chunk arrived out of order.
    #[error("out of order chunk: expected index {expected}, got {got}")]
    OutOfOrderChunk {
        /// The index the upload engine was expecting next.
        expected: u64,
        /// The index actually received.
        got: u64,
    },

    /// The underlying storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A command arrived whose session was not found in the registry; this
    /// indicates a programming error in the dispatch loop rather than a
    /// client-triggerable condition.
    #[error("session not registered: {0}")]
    SessionNotFound(u64),

    /// Any other failure that does not fit a more specific kind.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Returns true if retrying the same operation later might succeed.
    ///
    /// Only storage failures are potentially transient; every other kind
    /// reflects a client or caller mistake that retrying will not fix.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// A short, user-facing description suitable for the `Message` field of
    /// an error response. Does not leak internal details for `Internal`.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Internal(_) => "an internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}
