//! Command dispatcher: ties sessions, catalogs, engines, and the user store
//! together into the action-based event loop that the connection task drives.

use cargohold_core::{Environment, Session, SessionError};
use cargohold_proto::{
    CommandCode, Packet,
    payloads::{
        auth::{CreateAccountRequestBody, CreateAccountResponseBody, LoginRequestBody, LoginResponseBody, LogoutResponseBody},
        directories::{
            DirectoryContentsResponseBody, DirectoryCreateRequestBody, DirectoryCreateResponseBody,
            DirectoryListResponseBody, DirectoryRenameRequestBody, DirectoryRenameResponseBody, DirectorySummary,
            FileMoveRequestBody, FileMoveResponseBody,
        },
        error::ErrorResponseBody,
        files::{AckResponseBody, DownloadInitResponseBody, FileListResponseBody, FileSummary, UploadInitRequestBody, UploadInitResponseBody},
        decode_body, encode_body,
    },
};
use uuid::Uuid;

use crate::{
    catalog::{DirectoryCatalog, FileCatalog},
    engine::{DownloadEngine, UploadEngine},
    error::ServerError,
    registry::SessionRegistry,
    storage::Storage,
    user_store::{UserStore, UserStoreError},
};

/// Severity of a log action emitted by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Routine informational event.
    Info,
    /// Recoverable problem.
    Warn,
    /// Unexpected failure.
    Error,
}

/// Events the dispatcher processes, produced by the connection task.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// A new TCP connection was accepted.
    ConnectionAccepted {
        /// Id the session manager assigned.
        session_id: u64,
    },
    /// A full packet was read off a connection.
    PacketReceived {
        /// The connection the packet arrived on.
        session_id: u64,
        /// The decoded packet.
        packet: Packet,
    },
    /// A connection was closed, by the peer or by us.
    ConnectionClosed {
        /// The connection that closed.
        session_id: u64,
        /// Human-readable reason, for logging.
        reason: String,
    },
    /// Periodic liveness sweep tick.
    Tick,
}

/// Actions the dispatcher produces, executed by the connection task or the
/// acceptor loop.
#[derive(Debug, Clone)]
pub enum ServerAction {
    /// Send a packet back to a session.
    SendPacket {
        /// Target session.
        session_id: u64,
        /// Packet to send.
        packet: Packet,
    },
    /// Close a connection.
    CloseConnection {
        /// Session to close.
        session_id: u64,
        /// Reason for closure.
        reason: String,
    },
    /// Emit a log line.
    Log {
        /// Severity.
        level: LogLevel,
        /// Message text.
        message: String,
    },
}

/// Runtime configuration the dispatcher needs but does not own the source of
/// (assembled from [`crate::config::ServerRuntimeConfig`] at startup).
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    /// Admission cap for concurrent sessions.
    pub max_concurrent_clients: usize,
    /// Upload/download chunk size in bytes.
    pub chunk_size: u64,
    /// Inactivity cutoff before a session is swept by [`ServerEvent::Tick`].
    pub session_timeout: std::time::Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { max_concurrent_clients: 1000, chunk_size: 1024 * 1024, session_timeout: std::time::Duration::from_secs(30 * 60) }
    }
}

/// Ties together the session registry, catalogs, engines, and user store,
/// dispatching each accepted packet to its handler and producing the actions
/// an outer driver (a tokio task, or a test harness) executes.
pub struct ServerDriver<E: Environment, S: Storage, U: UserStore> {
    sessions: SessionRegistry<E::Instant>,
    directories: DirectoryCatalog<S>,
    files: FileCatalog<S>,
    uploads: UploadEngine<S>,
    downloads: DownloadEngine<S>,
    users: U,
    env: E,
    config: DriverConfig,
}

impl<E: Environment, S: Storage, U: UserStore> ServerDriver<E, S, U> {
    /// Builds a new dispatcher over already-constructed catalogs/engines.
    #[must_use]
    pub fn new(env: E, storage: S, users: U, directories: DirectoryCatalog<S>, files: FileCatalog<S>, config: DriverConfig) -> Self {
        Self {
            sessions: SessionRegistry::new(config.max_concurrent_clients),
            directories,
            files,
            uploads: UploadEngine::new(storage.clone()),
            downloads: DownloadEngine::new(storage),
            users,
            env,
            config,
        }
    }

    /// Processes one event, returning the actions to execute.
    pub fn process_event(&mut self, event: ServerEvent) -> Vec<ServerAction> {
        match event {
            ServerEvent::ConnectionAccepted { session_id } => self.handle_connection_accepted(session_id),
            ServerEvent::PacketReceived { session_id, packet } => self.handle_packet(session_id, packet),
            ServerEvent::ConnectionClosed { session_id, reason } => self.handle_connection_closed(session_id, &reason),
            ServerEvent::Tick => self.handle_tick(),
        }
    }

    fn handle_connection_accepted(&mut self, session_id: u64) -> Vec<ServerAction> {
        let now = self.env.now();
        let session =
            Session::new(session_id, now, cargohold_core::SessionConfig { session_timeout: self.config.session_timeout });

        if self.sessions.try_register(session).is_none() {
            return vec![ServerAction::CloseConnection {
                session_id,
                reason: "max concurrent clients reached".to_string(),
            }];
        }

        vec![ServerAction::Log { level: LogLevel::Debug, message: format!("session {session_id} accepted") }]
    }

    fn handle_connection_closed(&mut self, session_id: u64, reason: &str) -> Vec<ServerAction> {
        self.sessions.unregister(session_id);
        vec![ServerAction::Log { level: LogLevel::Info, message: format!("session {session_id} closed: {reason}") }]
    }

    fn handle_tick(&mut self) -> Vec<ServerAction> {
        let now = self.env.now();
        self.sessions
            .sweep_timeouts(now)
            .into_iter()
            .map(|session_id| ServerAction::CloseConnection { session_id, reason: "SessionTimeout".to_string() })
            .collect()
    }

    fn handle_packet(&mut self, session_id: u64, packet: Packet) -> Vec<ServerAction> {
        let Some(session) = self.sessions.get(session_id) else {
            return vec![ServerAction::Log {
                level: LogLevel::Warn,
                message: format!("packet from unregistered session {session_id}"),
            }];
        };

        if let Err(err) = session.gate(packet.command) {
            return self.session_error_response(session_id, &packet, err);
        }
        if let Err(err) = session.authorize(&packet.user_id) {
            return self.session_error_response(session_id, &packet, err);
        }

        let now = self.env.now();
        self.sessions.update(session_id, |s| s.update_activity(now));

        match self.dispatch(session_id, &session, &packet) {
            Ok(actions) => actions,
            Err(err) => self.server_error_response(session_id, &packet, err),
        }
    }

    fn dispatch(&mut self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        match packet.command {
            CommandCode::LOGIN_REQUEST => self.handle_login(session_id, packet),
            CommandCode::CREATE_ACCOUNT_REQUEST => self.handle_create_account(session_id, packet),
            CommandCode::LOGOUT_REQUEST => self.handle_logout(session_id, packet),
            CommandCode::FILE_LIST_REQUEST => self.handle_file_list(session_id, session, packet),
            CommandCode::UPLOAD_INIT_REQUEST => self.handle_upload_init(session_id, session, packet),
            CommandCode::UPLOAD_CHUNK_REQUEST => self.handle_upload_chunk(session_id, session, packet),
            CommandCode::UPLOAD_COMPLETE_REQUEST => self.handle_upload_complete(session_id, session, packet),
            CommandCode::DOWNLOAD_INIT_REQUEST => self.handle_download_init(session_id, session, packet),
            CommandCode::DOWNLOAD_CHUNK_REQUEST => self.handle_download_chunk(session_id, session, packet),
            CommandCode::DOWNLOAD_COMPLETE_REQUEST => self.handle_download_complete(session_id, session, packet),
            CommandCode::FILE_DELETE_REQUEST => self.handle_file_delete(session_id, session, packet),
            CommandCode::DIRECTORY_CREATE_REQUEST => self.handle_directory_create(session_id, session, packet),
            CommandCode::DIRECTORY_LIST_REQUEST => self.handle_directory_list(session_id, session, packet),
            CommandCode::DIRECTORY_RENAME_REQUEST => self.handle_directory_rename(session_id, session, packet),
            CommandCode::DIRECTORY_DELETE_REQUEST => self.handle_directory_delete(session_id, session, packet),
            CommandCode::FILE_MOVE_REQUEST => self.handle_file_move(session_id, session, packet),
            CommandCode::DIRECTORY_CONTENTS_REQUEST => self.handle_directory_contents(session_id, session, packet),
            other => Err(ServerError::Internal(format!("unhandled request code {other}"))),
        }
    }

    fn respond(&self, session_id: u64, request: &Packet, body: &impl serde::Serialize) -> Result<ServerAction, ServerError> {
        let response_code = CommandCode::response_for(request.command)
            .ok_or_else(|| ServerError::Internal(format!("{} is not a request code", request.command)))?;
        let bytes = encode_body(response_code, body).map_err(|err| ServerError::Internal(err.to_string()))?;
        let packet = Packet::new(response_code, request.packet_id, request.user_id.clone(), self.env.wall_clock_nanos())
            .with_payload(bytes);
        Ok(ServerAction::SendPacket { session_id, packet })
    }

    fn handle_login(&mut self, session_id: u64, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let body: LoginRequestBody = decode_body(packet.command, &packet.payload).map_err(|err| ServerError::Internal(err.to_string()))?;

        let response = match self.users.verify_credentials(&body.username, &body.password) {
            Ok(user) => {
                self.sessions.update(session_id, |s| s.authenticate(user.user_id.clone()));
                LoginResponseBody { success: true, message: "login succeeded".to_string(), user_id: user.user_id }
            },
            Err(UserStoreError::NotFound | UserStoreError::InvalidCredentials) => {
                LoginResponseBody { success: false, message: "invalid username or password".to_string(), user_id: String::new() }
            },
            Err(UserStoreError::UsernameTaken) => {
                return Err(ServerError::Internal("unexpected UsernameTaken from verify_credentials".to_string()));
            },
        };

        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_create_account(&mut self, session_id: u64, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let body: CreateAccountRequestBody =
            decode_body(packet.command, &packet.payload).map_err(|err| ServerError::Internal(err.to_string()))?;

        let response = match self.users.create_user(&body.username, &body.password, &body.email) {
            Ok(_user) => CreateAccountResponseBody { success: true, message: "account created".to_string() },
            Err(UserStoreError::UsernameTaken) => {
                CreateAccountResponseBody { success: false, message: "username already exists".to_string() }
            },
            Err(other) => return Err(ServerError::Internal(other.to_string())),
        };

        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_logout(&mut self, session_id: u64, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        self.sessions.update(session_id, Session::begin_disconnect);
        let response = LogoutResponseBody { success: true, message: "goodbye".to_string() };
        // Per the logout protocol rule: send the response, let it flush,
        // then close - the two actions execute strictly in order, so the
        // write is guaranteed to complete before the socket shuts down.
        Ok(vec![
            self.respond(session_id, packet, &response)?,
            ServerAction::CloseConnection { session_id, reason: "client logged out".to_string() },
        ])
    }

    fn handle_file_list(&self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?;
        let directory_id: Option<String> = packet.metadata.get("DirectoryId").cloned();
        let records = self.files.list_in_directory(directory_id.as_deref(), owner);
        let response = FileListResponseBody { files: records.into_iter().map(to_file_summary).collect() };
        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_upload_init(&mut self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?.to_string();
        let body: UploadInitRequestBody =
            decode_body(packet.command, &packet.payload).map_err(|err| ServerError::Internal(err.to_string()))?;
        let directory_id: Option<String> = packet.metadata.get("DirectoryId").cloned();
        let now = self.env.wall_clock_nanos();

        let response = match self.uploads.initialize(
            &self.files,
            &self.directories,
            &owner,
            directory_id.as_deref(),
            &body.file_name,
            body.file_size,
            &body.content_type,
            self.config.chunk_size,
            now,
        ) {
            Ok(record) => UploadInitResponseBody { success: true, message: "upload initialized".to_string(), file_id: record.id },
            Err(ServerError::Conflict(message)) => UploadInitResponseBody { success: false, message, file_id: String::new() },
            Err(other) => return Err(other),
        };

        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_upload_chunk(&mut self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?.to_string();
        let file_id = required_metadata(packet, "FileId")?;
        let index: u64 = packet.metadata_parsed("ChunkIndex").ok_or_else(|| ServerError::Internal("missing ChunkIndex".to_string()))?;
        let is_last_chunk: bool = packet.metadata_parsed("IsLastChunk").unwrap_or(false);
        let now = self.env.wall_clock_nanos();

        let response = match self
            .uploads
            .append_chunk(&self.files, &owner, &file_id, index, &packet.payload, self.config.chunk_size, is_last_chunk, now)
        {
            Ok(_is_last) => AckResponseBody::ok("chunk accepted"),
            Err(ServerError::OutOfOrderChunk { expected, got }) => {
                AckResponseBody::failed(format!("out of order chunk: expected {expected}, got {got}"))
            },
            Err(other) => return Err(other),
        };

        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_upload_complete(&mut self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?.to_string();
        let file_id = required_metadata(packet, "FileId")?;
        let now = self.env.wall_clock_nanos();

        self.uploads.finalize(&self.files, &owner, &file_id, now)?;
        let response = AckResponseBody::ok("upload finalized");
        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_download_init(&self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?;
        let file_id = required_metadata(packet, "FileId")?;

        let response = match self.downloads.initialize(&self.files, owner, &file_id) {
            Ok(record) => DownloadInitResponseBody {
                success: true,
                message: "download initialized".to_string(),
                file_size: record.size,
                total_chunks: record.total_chunks,
            },
            Err(ServerError::Conflict(message)) => DownloadInitResponseBody { success: false, message, file_size: 0, total_chunks: 0 },
            Err(other) => return Err(other),
        };

        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_download_chunk(&self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?;
        let file_id = required_metadata(packet, "FileId")?;
        let index: u64 = packet.metadata_parsed("ChunkIndex").ok_or_else(|| ServerError::Internal("missing ChunkIndex".to_string()))?;

        let (bytes, is_last) = self.downloads.get_chunk(&self.files, owner, &file_id, index, self.config.chunk_size)?;

        let response_code = CommandCode::response_for(packet.command)
            .ok_or_else(|| ServerError::Internal(format!("{} is not a request code", packet.command)))?;
        let response_packet = Packet::new(response_code, packet.packet_id, packet.user_id.clone(), self.env.wall_clock_nanos())
            .with_metadata("FileId", file_id)
            .with_metadata("ChunkIndex", index.to_string())
            .with_metadata("IsLastChunk", is_last.to_string())
            .with_payload(bytes);

        Ok(vec![ServerAction::SendPacket { session_id, packet: response_packet }])
    }

    fn handle_download_complete(&self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?;
        let file_id = required_metadata(packet, "FileId")?;
        self.downloads.complete(&self.files, owner, &file_id)?;
        let response = AckResponseBody::ok("download complete");
        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_file_delete(&mut self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?.to_string();
        let file_id = required_metadata(packet, "FileId")?;
        self.files.delete(&file_id, &owner)?;
        let response = AckResponseBody::ok("file deleted");
        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_directory_create(&mut self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?.to_string();
        let body: DirectoryCreateRequestBody =
            decode_body(packet.command, &packet.payload).map_err(|err| ServerError::Internal(err.to_string()))?;
        let parent_id: Option<String> = packet.metadata.get("ParentDirectoryId").cloned();
        let now = self.env.wall_clock_nanos();

        let response = match self.directories.create(&owner, &body.directory_name, parent_id.as_deref(), now) {
            Ok(record) => DirectoryCreateResponseBody { success: true, message: "directory created".to_string(), directory_id: record.id },
            Err(ServerError::Conflict(message)) => DirectoryCreateResponseBody { success: false, message, directory_id: String::new() },
            Err(other) => return Err(other),
        };

        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_directory_list(&self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?;
        let parent_id: Option<String> = packet.metadata.get("ParentDirectoryId").cloned();
        let (children, _files) = self.directories.list_children(parent_id.as_deref(), owner, &self.files);
        let response = DirectoryListResponseBody { directories: children.into_iter().map(to_directory_summary).collect() };
        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_directory_rename(&mut self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?.to_string();
        let directory_id = required_metadata(packet, "DirectoryId")?;
        let body: DirectoryRenameRequestBody =
            decode_body(packet.command, &packet.payload).map_err(|err| ServerError::Internal(err.to_string()))?;
        let now = self.env.wall_clock_nanos();

        let response = match self.directories.rename(&directory_id, &body.new_name, &owner, &self.files, now) {
            Ok(_record) => DirectoryRenameResponseBody { success: true, message: "directory renamed".to_string() },
            Err(ServerError::Conflict(message)) => DirectoryRenameResponseBody { success: false, message },
            Err(other) => return Err(other),
        };

        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_directory_delete(&mut self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?.to_string();
        let directory_id = required_metadata(packet, "DirectoryId")?;
        let recursive: bool = packet.metadata_parsed("Recursive").unwrap_or(false);

        let response = match self.directories.delete(&directory_id, &owner, recursive, &self.files) {
            Ok(()) => AckResponseBody::ok("directory deleted"),
            Err(ServerError::Conflict(message)) => AckResponseBody::failed(message),
            Err(other) => return Err(other),
        };

        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_file_move(&mut self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?.to_string();
        let body: FileMoveRequestBody =
            decode_body(packet.command, &packet.payload).map_err(|err| ServerError::Internal(err.to_string()))?;
        let target_directory_id: Option<String> = packet.metadata.get("DirectoryId").cloned();
        let now = self.env.wall_clock_nanos();

        let target_path = match &target_directory_id {
            Some(id) => self.directories.get(id, &owner)?.physical_path,
            None => self.directories.root_path(&owner),
        };

        let moved_count = self.files.move_files(&body.file_ids, &owner, target_directory_id.as_deref(), &target_path, now)?;
        let response = FileMoveResponseBody { success: true, message: "files moved".to_string(), moved_count };
        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn handle_directory_contents(&self, session_id: u64, session: &Session<E::Instant>, packet: &Packet) -> Result<Vec<ServerAction>, ServerError> {
        let owner = owner_of(session)?;
        let directory_id: Option<String> = packet.metadata.get("DirectoryId").cloned();
        let (directories, files) = self.directories.list_children(directory_id.as_deref(), owner, &self.files);
        let response = DirectoryContentsResponseBody {
            directories: directories.into_iter().map(to_directory_summary).collect(),
            files: files.into_iter().map(to_file_summary).collect(),
        };
        Ok(vec![self.respond(session_id, packet, &response)?])
    }

    fn session_error_response(&self, session_id: u64, request: &Packet, error: SessionError) -> Vec<ServerAction> {
        let body = ErrorResponseBody::for_command(request.command, error.to_string());
        let bytes = match encode_body(CommandCode::ERROR, &body) {
            Ok(bytes) => bytes,
            Err(err) => return vec![ServerAction::Log { level: LogLevel::Error, message: format!("failed to encode error response: {err}") }],
        };
        let packet = Packet::new(CommandCode::ERROR, Uuid::new_v4(), request.user_id.clone(), self.env.wall_clock_nanos()).with_payload(bytes);
        vec![
            ServerAction::SendPacket { session_id, packet },
            ServerAction::Log { level: LogLevel::Warn, message: format!("session {session_id} rejected: {error}") },
        ]
    }

    fn server_error_response(&self, session_id: u64, request: &Packet, error: ServerError) -> Vec<ServerAction> {
        let response_code = CommandCode::response_for(request.command).unwrap_or(CommandCode::ERROR);
        let body = ErrorResponseBody::for_command(request.command, error.user_message());
        let bytes = match encode_body(response_code, &body) {
            Ok(bytes) => bytes,
            Err(err) => return vec![ServerAction::Log { level: LogLevel::Error, message: format!("failed to encode error response: {err}") }],
        };
        let packet = Packet::new(response_code, request.packet_id, request.user_id.clone(), self.env.wall_clock_nanos()).with_payload(bytes);

        let level = if error.is_transient() { LogLevel::Warn } else { LogLevel::Error };
        vec![
            ServerAction::SendPacket { session_id, packet },
            ServerAction::Log { level, message: format!("command {} failed for session {session_id}: {error}", request.command) },
        ]
    }

    /// Number of currently-admitted sessions.
    #[must_use]
    pub fn active_session_count(&self) -> usize {
        self.sessions.active_count()
    }

    /// Returns `session_id`'s cancellation token, if it is currently
    /// admitted. The connection task awaits this alongside its socket read
    /// so a timeout sweep or shutdown can interrupt a blocked read.
    #[must_use]
    pub fn session_cancellation(&self, session_id: u64) -> Option<tokio_util::sync::CancellationToken> {
        self.sessions.cancellation_token(session_id)
    }

    /// Cancels every admitted session's token, for graceful shutdown.
    pub fn shutdown(&self) {
        self.sessions.cancel_all();
    }
}

fn owner_of<I: Copy + Ord + std::ops::Sub<Output = std::time::Duration>>(
    session: &Session<I>,
) -> Result<&str, ServerError> {
    session.user_id().ok_or_else(|| ServerError::Internal("authenticated session missing user_id".to_string()))
}

fn required_metadata(packet: &Packet, key: &str) -> Result<String, ServerError> {
    packet.metadata.get(key).cloned().ok_or_else(|| ServerError::Internal(format!("missing {key} metadata")))
}

fn to_file_summary(record: crate::catalog::FileRecord) -> FileSummary {
    FileSummary {
        file_id: record.id,
        file_name: record.name,
        file_size: record.size,
        content_type: record.content_type,
        directory_id: record.directory_id.unwrap_or_default(),
        is_complete: record.is_complete,
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

fn to_directory_summary(record: crate::catalog::DirectoryRecord) -> DirectorySummary {
    DirectorySummary {
        directory_id: record.id,
        name: record.name,
        parent_directory_id: record.parent_id.unwrap_or_default(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}
