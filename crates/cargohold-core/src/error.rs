//! Session-layer errors.
//!
//! Catalog- and storage-level errors (`NotFound`, `Conflict`,
//! `OutOfOrderChunk`, `StorageError`) are defined in `cargohold-server`,
//! which is the layer that owns catalogs and physical storage; this crate
//! only knows about framing and session-lifecycle failures.

use thiserror::Error;

use crate::session::SessionState;

/// Errors that can occur while driving the session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The underlying frame or packet could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] cargohold_proto::ProtocolError),

    /// The peer closed the connection, gracefully or otherwise.
    #[error("connection closed")]
    ConnectionClosed,

    /// A command that requires authentication arrived before login.
    #[error("unauthorized: command {command} requires an authenticated session")]
    Unauthorized {
        /// Command code that was rejected.
        command: i32,
    },

    /// An authenticated session tried to log in or create an account again.
    #[error("already authenticated: command {command} is only valid before login")]
    AlreadyAuthenticated {
        /// Command code that was rejected.
        command: i32,
    },

    /// The packet's `user_id` field did not match the session's
    /// authenticated user id.
    #[error("authorization mismatch: packet user id does not match session")]
    AuthorizationMismatch,

    /// A command arrived for a session that has already started closing.
    #[error("invalid state: cannot process command {command} while {state:?}")]
    InvalidState {
        /// Session state at the time of the attempt.
        state: SessionState,
        /// Command code that was rejected.
        command: i32,
    },
}

impl SessionError {
    /// Returns true if retrying the same operation later might succeed.
    ///
    /// Protocol violations and authorization failures are never transient -
    /// the peer must fix its request, not merely retry it.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        false
    }
}
