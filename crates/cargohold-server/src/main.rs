//! Cargohold server binary.
//!
//! # Usage
//!
//! ```bash
//! cargohold-server --port 9876 --storage-path ./data/storage
//! cargohold-server --config cargohold.toml
//! ```

use std::path::PathBuf;

use cargohold_server::{
    FsStorage, InMemoryUserStore, Server, ServerDriver, ServerRuntimeConfig, SystemEnv,
    catalog::{DirectoryCatalog, FileCatalog},
};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Cargohold file server
#[derive(Parser, Debug)]
#[command(name = "cargohold-server")]
#[command(about = "Cargohold cloud file server")]
#[command(version)]
struct Args {
    /// Optional TOML config file; individual settings below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// TCP port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Root directory for per-user physical storage
    #[arg(long)]
    storage_path: Option<PathBuf>,

    /// Directory holding catalog snapshot files
    #[arg(long)]
    metadata_path: Option<PathBuf>,

    /// Maximum concurrent connected clients
    #[arg(long)]
    max_concurrent_clients: Option<usize>,

    /// Inactivity cutoff, in minutes, before a session is closed
    #[arg(long)]
    session_timeout_minutes: Option<u64>,

    /// Upload/download chunk size, in bytes
    #[arg(long)]
    chunk_size: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn apply(&self, mut config: ServerRuntimeConfig) -> ServerRuntimeConfig {
        if let Some(v) = self.port {
            config.port = v;
        }
        if let Some(v) = self.storage_path.clone() {
            config.storage_path = v;
        }
        if let Some(v) = self.metadata_path.clone() {
            config.metadata_path = v;
        }
        if let Some(v) = self.max_concurrent_clients {
            config.driver.max_concurrent_clients = v;
        }
        if let Some(v) = self.session_timeout_minutes {
            config.driver.session_timeout = std::time::Duration::from_secs(v * 60);
        }
        if let Some(v) = self.chunk_size {
            config.driver.chunk_size = v;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let mut config = ServerRuntimeConfig::default();
    if let Some(path) = &args.config {
        config = config.merge_file(path)?;
    }
    config = config.merge_env();
    config = args.apply(config);

    tracing::info!("cargohold server starting");
    tracing::info!("storage path: {}", config.storage_path.display());
    tracing::info!("metadata path: {}", config.metadata_path.display());

    std::fs::create_dir_all(&config.storage_path)?;
    std::fs::create_dir_all(&config.metadata_path)?;

    let env = SystemEnv::new();
    let storage = FsStorage::new();
    let users = InMemoryUserStore::new();

    let directories = DirectoryCatalog::load(
        storage.clone(),
        config.storage_path.clone(),
        config.metadata_path.join("directories.json"),
    )?;
    let files = FileCatalog::load(storage.clone(), config.metadata_path.join("files.json"))?;

    let driver_config = config.driver;
    let driver: ServerDriver<SystemEnv, FsStorage, InMemoryUserStore> =
        ServerDriver::new(env, storage, users, directories, files, driver_config);

    let server = Server::bind(config, driver).await?;
    tracing::info!("listening on {}", server.local_addr()?);
    server.run().await?;

    Ok(())
}
