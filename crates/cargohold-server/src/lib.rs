//! Cargohold production server.
//!
//! Production server implementation using Tokio for async I/O, the real
//! filesystem for storage, and system time with cryptographic RNG.
//!
//! # Architecture
//!
//! This crate provides production "glue" that wraps `cargohold_core`'s
//! action-based session logic with real I/O. [`ServerDriver`] follows the
//! Sans-IO pattern (see `cargohold_core` for details) — it is pure logic,
//! no sockets — while [`Server`] in [`session_io`] drives Tokio TCP and
//! executes the actions it returns.
//!
//! # Components
//!
//! - [`driver::ServerDriver`]: action-based command dispatcher (pure logic)
//! - [`session_io::Server`]: production runtime that accepts connections and
//!   executes dispatcher actions
//! - [`system_env::SystemEnv`]: production environment (real time, crypto RNG)
//! - [`catalog`]: directory and file metadata catalogs
//! - [`engine`]: upload and download chunk-transfer engines
//! - [`storage`]: physical byte-level storage adapter
//! - [`user_store`]: pluggable account store and credential hashing
//! - [`config`]: runtime configuration assembly (defaults, file, env, CLI)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod registry;
pub mod session_io;
pub mod storage;
pub mod system_env;
pub mod user_store;

pub use config::{ConfigError, ServerRuntimeConfig};
pub use driver::{DriverConfig, LogLevel, ServerAction, ServerDriver, ServerEvent};
pub use error::ServerError;
pub use registry::SessionRegistry;
pub use session_io::Server;
pub use storage::{FsStorage, MemoryStorage, Storage, StorageError};
pub use system_env::SystemEnv;
pub use user_store::{CredentialHasher, InMemoryUserStore, Sha256Hasher, UserRecord, UserStore, UserStoreError};
