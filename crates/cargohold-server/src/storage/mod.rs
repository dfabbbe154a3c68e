//! Physical storage adapter: byte-level file I/O and directory management.
//!
//! Operations are synchronous, matching the teacher's storage trait shape;
//! the server calls them from within `tokio::task::spawn_blocking` at the
//! call sites that touch the real filesystem so a slow disk never stalls
//! the async runtime. Callers decide whether a failure is fatal to a
//! command or just logged and rolled back.

pub mod fs;
pub mod memory;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

/// Errors from the physical storage adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The path does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The path already exists where a fresh create was expected.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// An underlying I/O operation failed.
    #[error("io error at {path}: {message}")]
    Io {
        /// Path the operation was acting on.
        path: String,
        /// Underlying error message.
        message: String,
    },
}

impl StorageError {
    fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io { path: path.display().to_string(), message: err.to_string() }
    }
}

/// Byte-level physical storage, implemented either against the real
/// filesystem ([`FsStorage`]) or in memory ([`MemoryStorage`], used by
/// catalog and engine unit tests so they never touch a real disk).
pub trait Storage: Clone + Send + Sync + 'static {
    /// Creates an empty file at `path`, creating parent directories as
    /// needed. Fails with [`StorageError::AlreadyExists`] if the file is
    /// already present.
    fn create_empty_file(&self, path: &Path) -> Result<(), StorageError>;

    /// Writes `bytes` at `offset` within the file at `path`. The file must
    /// already exist (created via [`Self::create_empty_file`]).
    fn write_chunk(&self, path: &Path, offset: u64, bytes: &[u8]) -> Result<(), StorageError>;

    /// Reads up to `len` bytes starting at `offset` from the file at `path`.
    fn read_chunk(&self, path: &Path, offset: u64, len: usize) -> Result<Vec<u8>, StorageError>;

    /// Returns the current on-disk size of the file at `path`.
    fn file_size(&self, path: &Path) -> Result<u64, StorageError>;

    /// Moves (renames) the file at `from` to `to`, creating `to`'s parent
    /// directory if it does not exist.
    fn move_file(&self, from: &Path, to: &Path) -> Result<(), StorageError>;

    /// Deletes the file at `path`. Not an error if the file is already
    /// absent, since delete is idempotent from the catalog's point of view.
    fn delete_file(&self, path: &Path) -> Result<(), StorageError>;

    /// Creates a directory at `path`, including parents.
    fn create_directory(&self, path: &Path) -> Result<(), StorageError>;

    /// Renames the directory at `from` to `to`.
    fn rename_directory(&self, from: &Path, to: &Path) -> Result<(), StorageError>;

    /// Deletes the directory at `path`. If `recursive` is false the
    /// directory must already be empty.
    fn delete_directory(&self, path: &Path, recursive: bool) -> Result<(), StorageError>;
}

/// Builds the physical path for a file stored directly under a directory:
/// `<directory_path>/<file_id>_<sanitized_name>`, per the persisted-state
/// layout.
#[must_use]
pub fn file_path(directory_path: &Path, file_id: &str, sanitized_name: &str) -> PathBuf {
    directory_path.join(format!("{file_id}_{sanitized_name}"))
}
