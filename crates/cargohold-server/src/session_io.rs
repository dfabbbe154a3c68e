//! Tokio TCP acceptor: the only part of the server that touches a live
//! socket. Translates bytes into [`ServerEvent`]s for [`ServerDriver`] and
//! executes the [`ServerAction`]s it returns.
//!
//! Reads and writes on one connection are serialized by construction: a
//! connection's read half is only ever touched by that connection's own
//! task, and every write goes through that connection's `writer` mutex, so
//! concurrent readers or concurrent writers on the same socket cannot occur.

use std::{collections::HashMap, sync::Arc, time::Duration};

use bytes::BytesMut;
use cargohold_core::Environment as _;
use cargohold_proto::{decode_frame_body, encode_frame, validate_frame_length};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        TcpListener,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::Mutex as AsyncMutex,
};

use crate::{
    config::ServerRuntimeConfig,
    driver::{LogLevel, ServerAction, ServerDriver, ServerEvent},
    error::ServerError,
    storage::FsStorage,
    system_env::SystemEnv,
    user_store::InMemoryUserStore,
};

/// Concrete driver instantiation the production binary runs.
type ProductionDriver = ServerDriver<SystemEnv, FsStorage, InMemoryUserStore>;

const TICK_INTERVAL: Duration = Duration::from_secs(60);

struct SharedState {
    writers: AsyncMutex<HashMap<u64, Arc<AsyncMutex<OwnedWriteHalf>>>>,
}

/// Production server: owns the listening socket and the shared dispatcher.
pub struct Server {
    driver: Arc<AsyncMutex<ProductionDriver>>,
    listener: TcpListener,
    config: ServerRuntimeConfig,
}

impl Server {
    /// Binds a listener on `config.port` and wraps `driver` for dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Internal`] if the port cannot be bound.
    pub async fn bind(config: ServerRuntimeConfig, driver: ProductionDriver) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(("0.0.0.0", config.port))
            .await
            .map_err(|err| ServerError::Internal(format!("failed to bind port {}: {err}", config.port)))?;
        Ok(Self { driver: Arc::new(AsyncMutex::new(driver)), listener, config })
    }

    /// Local address the server is bound to.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Internal`] if the OS cannot report the local
    /// address of an already-bound socket.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        self.listener.local_addr().map_err(|err| ServerError::Internal(err.to_string()))
    }

    /// Runs the accept loop and the periodic timeout-sweep tick until the
    /// process is killed or the listener errors.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Internal`] if the listener itself fails.
    pub async fn run(self) -> Result<(), ServerError> {
        tracing::info!("cargohold server listening on {}", self.local_addr()?);

        let shared = Arc::new(SharedState { writers: AsyncMutex::new(HashMap::new()) });
        let buffer_size = self.config.network_buffer_size;

        {
            let driver = Arc::clone(&self.driver);
            let shared = Arc::clone(&shared);
            tokio::spawn(async move { run_tick_loop(driver, shared).await });
        }

        loop {
            let (socket, addr) = self
                .listener
                .accept()
                .await
                .map_err(|err| ServerError::Internal(format!("accept failed: {err}")))?;

            tracing::debug!("accepted connection from {addr}");
            let driver = Arc::clone(&self.driver);
            let shared = Arc::clone(&shared);

            tokio::spawn(async move {
                if let Err(err) = handle_connection(socket, driver, shared, buffer_size).await {
                    tracing::warn!("connection from {addr} ended with error: {err}");
                }
            });
        }
    }
}

async fn run_tick_loop(driver: Arc<AsyncMutex<ProductionDriver>>, shared: Arc<SharedState>) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    loop {
        interval.tick().await;
        let actions = driver.lock().await.process_event(ServerEvent::Tick);
        execute_actions(actions, &shared).await;
    }
}

async fn handle_connection(
    socket: tokio::net::TcpStream,
    driver: Arc<AsyncMutex<ProductionDriver>>,
    shared: Arc<SharedState>,
    buffer_size: usize,
) -> Result<(), ServerError> {
    socket.set_nodelay(true).ok();
    let (read_half, write_half) = socket.into_split();
    let writer = Arc::new(AsyncMutex::new(write_half));

    let (session_id, admitted) = {
        let mut guard = driver.lock().await;
        // Session ids are assigned by the caller, not the driver, so the
        // acceptor can correlate them with its own connection bookkeeping;
        // the driver's Environment supplies the randomness.
        let id = random_session_id(&guard);
        let actions = guard.process_event(ServerEvent::ConnectionAccepted { session_id: id });
        drop(guard);
        shared.writers.lock().await.insert(id, Arc::clone(&writer));
        let admitted = !actions.iter().any(|a| matches!(a, ServerAction::CloseConnection { session_id: sid, .. } if *sid == id));
        execute_actions(actions, &shared).await;
        (id, admitted)
    };

    if !admitted {
        return Ok(());
    }

    let result = read_loop(session_id, read_half, &driver, &shared, buffer_size).await;

    shared.writers.lock().await.remove(&session_id);
    let reason = result.as_ref().err().map(ToString::to_string).unwrap_or_else(|| "closed".to_string());
    let actions = driver.lock().await.process_event(ServerEvent::ConnectionClosed { session_id, reason });
    execute_actions(actions, &shared).await;

    result
}

fn random_session_id(driver: &ProductionDriver) -> u64 {
    // Collisions are astronomically unlikely with a 64-bit random id and are
    // not worth a registry lookup on the hot accept path.
    loop {
        let candidate = SystemEnv::new().random_u64();
        if candidate != 0 && driver.session_cancellation(candidate).is_none() {
            return candidate;
        }
    }
}

async fn read_loop(
    session_id: u64,
    mut read_half: OwnedReadHalf,
    driver: &Arc<AsyncMutex<ProductionDriver>>,
    shared: &Arc<SharedState>,
    buffer_size: usize,
) -> Result<(), ServerError> {
    let cancellation = driver.lock().await.session_cancellation(session_id);

    loop {
        let mut len_buf = [0u8; 4];

        let read_result = match &cancellation {
            Some(token) => {
                tokio::select! {
                    res = read_half.read_exact(&mut len_buf) => res,
                    () = token.cancelled() => return Ok(()),
                }
            },
            None => read_half.read_exact(&mut len_buf).await,
        };

        if read_result.is_err() {
            return Ok(());
        }

        let length = i64::from(i32::from_le_bytes(len_buf));
        let body_len = match validate_frame_length(length) {
            Ok(len) => len,
            Err(err) => {
                tracing::warn!("session {session_id}: {err}");
                return Ok(());
            },
        };

        let mut body = BytesMut::with_capacity(body_len.min(buffer_size.max(4096)));
        body.resize(body_len, 0);
        if read_half.read_exact(&mut body[..]).await.is_err() {
            return Ok(());
        }

        let packet = match decode_frame_body(&body) {
            Ok(packet) => packet,
            Err(err) => {
                tracing::warn!("session {session_id}: malformed packet: {err}");
                continue;
            },
        };

        let actions = driver.lock().await.process_event(ServerEvent::PacketReceived { session_id, packet });
        execute_actions(actions, shared).await;
    }
}

async fn execute_actions(actions: Vec<ServerAction>, shared: &SharedState) {
    for action in actions {
        match action {
            ServerAction::SendPacket { session_id, packet } => {
                let writer = shared.writers.lock().await.get(&session_id).cloned();
                let Some(writer) = writer else {
                    tracing::warn!("SendPacket: session {session_id} has no open writer");
                    continue;
                };

                let wire = match encode_frame(&packet) {
                    Ok(wire) => wire,
                    Err(err) => {
                        tracing::error!("failed to encode frame for session {session_id}: {err}");
                        continue;
                    },
                };

                let mut guard = writer.lock().await;
                if let Err(err) = guard.write_all(&wire).await {
                    tracing::warn!("write failed for session {session_id}: {err}");
                    continue;
                }
                if let Err(err) = guard.flush().await {
                    tracing::warn!("flush failed for session {session_id}: {err}");
                }
            },

            ServerAction::CloseConnection { session_id, reason } => {
                tracing::info!("closing session {session_id}: {reason}");
                if let Some(writer) = shared.writers.lock().await.remove(&session_id) {
                    let mut guard = writer.lock().await;
                    guard.shutdown().await.ok();
                }
            },

            ServerAction::Log { level, message } => match level {
                LogLevel::Debug => tracing::debug!("{message}"),
                LogLevel::Info => tracing::info!("{message}"),
                LogLevel::Warn => tracing::warn!("{message}"),
                LogLevel::Error => tracing::error!("{message}"),
            },
        }
    }
}
