//! Runtime configuration: defaults, optional TOML file, `CARGOHOLD_*`
//! environment variables, and CLI flags layered lowest-to-highest.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

use crate::driver::DriverConfig;

/// Errors produced while assembling [`ServerRuntimeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file's contents were not valid TOML for this shape.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },
}

/// The subset of [`ServerRuntimeConfig`] that may appear in a TOML file,
/// every field optional so a file only needs to override what it cares
/// about.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    port: Option<u16>,
    network_buffer_size: Option<usize>,
    max_concurrent_clients: Option<usize>,
    session_timeout_minutes: Option<u64>,
    chunk_size: Option<u64>,
    storage_path: Option<PathBuf>,
    metadata_path: Option<PathBuf>,
}

/// Fully-resolved process configuration: the bind port and socket buffer
/// size the acceptor needs, plus everything [`DriverConfig`] and the
/// catalogs need.
#[derive(Debug, Clone)]
pub struct ServerRuntimeConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Socket and per-read chunk buffer size, in bytes.
    pub network_buffer_size: usize,
    /// Root directory for per-user physical storage.
    pub storage_path: PathBuf,
    /// Directory holding the catalog snapshot files.
    pub metadata_path: PathBuf,
    /// Dispatcher configuration (admission cap, chunk size, session timeout).
    pub driver: DriverConfig,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            port: 9876,
            network_buffer_size: 65536,
            storage_path: PathBuf::from("./data/storage"),
            metadata_path: PathBuf::from("./data/metadata"),
            driver: DriverConfig::default(),
        }
    }
}

impl ServerRuntimeConfig {
    /// Loads a [`FileConfig`] from `path`, applying each field present over
    /// `self`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`] if the file
    /// cannot be read or does not parse as TOML.
    pub fn merge_file(mut self, path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        let file: FileConfig = toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?;

        if let Some(v) = file.port {
            self.port = v;
        }
        if let Some(v) = file.network_buffer_size {
            self.network_buffer_size = v;
        }
        if let Some(v) = file.max_concurrent_clients {
            self.driver.max_concurrent_clients = v;
        }
        if let Some(v) = file.session_timeout_minutes {
            self.driver.session_timeout = std::time::Duration::from_secs(v * 60);
        }
        if let Some(v) = file.chunk_size {
            self.driver.chunk_size = v;
        }
        if let Some(v) = file.storage_path {
            self.storage_path = v;
        }
        if let Some(v) = file.metadata_path {
            self.metadata_path = v;
        }
        Ok(self)
    }

    /// Applies `CARGOHOLD_*` environment variable overrides, each parsed
    /// leniently: a variable that fails to parse is ignored rather than
    /// rejected, since the CLI flags layered on top are the last word
    /// anyway.
    #[must_use]
    pub fn merge_env(mut self) -> Self {
        if let Some(v) = env_parsed("CARGOHOLD_PORT") {
            self.port = v;
        }
        if let Some(v) = env_parsed("CARGOHOLD_NETWORK_BUFFER_SIZE") {
            self.network_buffer_size = v;
        }
        if let Some(v) = env_parsed("CARGOHOLD_MAX_CONCURRENT_CLIENTS") {
            self.driver.max_concurrent_clients = v;
        }
        if let Some(v) = env_parsed::<u64>("CARGOHOLD_SESSION_TIMEOUT_MINUTES") {
            self.driver.session_timeout = std::time::Duration::from_secs(v * 60);
        }
        if let Some(v) = env_parsed("CARGOHOLD_CHUNK_SIZE") {
            self.driver.chunk_size = v;
        }
        if let Ok(v) = std::env::var("CARGOHOLD_STORAGE_PATH") {
            self.storage_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CARGOHOLD_METADATA_PATH") {
            self.metadata_path = PathBuf::from(v);
        }
        self
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerRuntimeConfig::default();
        assert_eq!(config.port, 9876);
        assert!(config.driver.max_concurrent_clients > 0);
    }

    #[test]
    fn file_overrides_only_present_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "port = 1234\nchunk_size = 4096\n").unwrap();

        let config = ServerRuntimeConfig::default().merge_file(file.path()).unwrap();
        assert_eq!(config.port, 1234);
        assert_eq!(config.driver.chunk_size, 4096);
        assert_eq!(config.driver.max_concurrent_clients, 1000);
    }

    #[test]
    fn env_parsed_ignores_unset_and_unparseable() {
        assert_eq!(env_parsed::<u16>("CARGOHOLD_TEST_VAR_UNSET"), None);
    }
}
