//! Sans-IO session logic for the cargohold file server.
//!
//! # Architecture
//!
//! This crate holds the parts of the server that are pure functions of
//! state and events: the [`Environment`] abstraction for deterministic time
//! and randomness, the per-session [`session::Session`] state machine, and
//! the layered [`SessionError`] type. It depends on `cargohold-proto` for
//! wire types but never touches a socket or the filesystem - that glue
//! lives in `cargohold-server`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod env;
pub mod error;
pub mod session;

pub use env::Environment;
pub use error::SessionError;
pub use session::{LogLevel, Session, SessionConfig, SessionState};
