//! Reference cargohold TCP client.
//!
//! A minimal, blocking-per-call driver over the wire protocol: connect, send
//! one packet, read back the matching response. Used only by integration
//! tests that need to exercise the server end-to-end instead of through its
//! in-process [`cargohold_server::ServerDriver`] directly.
//!
//! # Architecture
//!
//! No session state machine lives here - a test drives the protocol
//! explicitly, one request/response pair at a time, which makes failures
//! easy to pin to a single step instead of hiding them behind client-side
//! retries or buffering.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use bytes::Bytes;
use cargohold_proto::{
    CommandCode, Packet,
    payloads::{
        auth::{CreateAccountRequestBody, CreateAccountResponseBody, LoginRequestBody, LoginResponseBody, LogoutResponseBody},
        directories::{
            DirectoryContentsResponseBody, DirectoryCreateRequestBody, DirectoryCreateResponseBody,
            DirectoryListResponseBody, DirectoryRenameRequestBody, DirectoryRenameResponseBody, FileMoveRequestBody,
            FileMoveResponseBody,
        },
        error::ErrorResponseBody,
        files::{AckResponseBody, DownloadInitResponseBody, FileListResponseBody, UploadInitRequestBody, UploadInitResponseBody},
        decode_body, encode_body,
    },
    decode_frame_body, encode_frame, validate_frame_length,
};
use thiserror::Error;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use uuid::Uuid;

/// Errors a client call can produce.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The TCP connection failed or was closed mid-exchange.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),
    /// A frame could not be encoded or decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] cargohold_proto::ProtocolError),
    /// The server returned an `ErrorResponse` body for the request.
    #[error("server rejected request: {0}")]
    Rejected(String),
}

/// A connected client session. Not authenticated until [`Self::login`] or
/// [`Self::create_account`] succeeds.
pub struct CargoholdClient {
    stream: TcpStream,
    user_id: String,
}

impl CargoholdClient {
    /// Opens a TCP connection to `addr`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connection`] if the connection cannot be
    /// established.
    pub async fn connect(addr: impl tokio::net::ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true).ok();
        Ok(Self { stream, user_id: String::new() })
    }

    /// The authenticated user id, empty until login/create-account succeeds.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    async fn send(&mut self, packet: Packet) -> Result<(), ClientError> {
        let wire = encode_frame(&packet)?;
        self.stream.write_all(&wire).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Packet, ClientError> {
        let mut len_buf = [0u8; 4];
        self.stream.read_exact(&mut len_buf).await?;
        let length = i64::from(i32::from_le_bytes(len_buf));
        let body_len = validate_frame_length(length)?;

        let mut body = vec![0u8; body_len];
        self.stream.read_exact(&mut body).await?;
        Ok(decode_frame_body(&body)?)
    }

    async fn call<Req: serde::Serialize, Resp: serde::de::DeserializeOwned>(
        &mut self,
        command: i32,
        metadata: &[(&str, String)],
        body: &Req,
    ) -> Result<Resp, ClientError> {
        let payload = encode_body(command, body)?;
        let mut packet = Packet::new(command, Uuid::new_v4(), self.user_id.clone(), 0).with_payload(payload);
        for (key, value) in metadata {
            packet = packet.with_metadata(*key, value.clone());
        }
        self.send(packet).await?;

        let response = self.recv().await?;
        if response.command == CommandCode::ERROR {
            let error: ErrorResponseBody = decode_body(response.command, &response.payload)?;
            return Err(ClientError::Rejected(error.message));
        }
        Ok(decode_body(response.command, &response.payload)?)
    }

    /// Logs in with `username`/`password`. On success, records the
    /// authenticated user id for subsequent requests.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] if the server sent an error
    /// response, or a connection/protocol error.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<LoginResponseBody, ClientError> {
        let body = LoginRequestBody { username: username.to_string(), password: password.to_string() };
        let response: LoginResponseBody = self.call(CommandCode::LOGIN_REQUEST, &[], &body).await?;
        if response.success {
            self.user_id = response.user_id.clone();
        }
        Ok(response)
    }

    /// Creates an account. Does not log in; call [`Self::login`] afterward.
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn create_account(&mut self, username: &str, password: &str, email: &str) -> Result<CreateAccountResponseBody, ClientError> {
        let body = CreateAccountRequestBody { username: username.to_string(), password: password.to_string(), email: email.to_string() };
        self.call(CommandCode::CREATE_ACCOUNT_REQUEST, &[], &body).await
    }

    /// Logs out of the current session.
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn logout(&mut self) -> Result<LogoutResponseBody, ClientError> {
        self.call(CommandCode::LOGOUT_REQUEST, &[], &()).await
    }

    /// Creates a directory named `name` under `parent_id` (root if `None`).
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn create_directory(&mut self, name: &str, parent_id: Option<&str>) -> Result<DirectoryCreateResponseBody, ClientError> {
        let body = DirectoryCreateRequestBody { directory_name: name.to_string() };
        let metadata = parent_id.map(|id| ("ParentDirectoryId", id.to_string())).into_iter().collect::<Vec<_>>();
        self.call(CommandCode::DIRECTORY_CREATE_REQUEST, &metadata, &body).await
    }

    /// Lists the subdirectories of `parent_id` (root if `None`).
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn list_directories(&mut self, parent_id: Option<&str>) -> Result<DirectoryListResponseBody, ClientError> {
        let metadata = parent_id.map(|id| ("ParentDirectoryId", id.to_string())).into_iter().collect::<Vec<_>>();
        self.call(CommandCode::DIRECTORY_LIST_REQUEST, &metadata, &()).await
    }

    /// Lists both files and subdirectories of `directory_id` (root if
    /// `None`).
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn directory_contents(&mut self, directory_id: Option<&str>) -> Result<DirectoryContentsResponseBody, ClientError> {
        let metadata = directory_id.map(|id| ("DirectoryId", id.to_string())).into_iter().collect::<Vec<_>>();
        self.call(CommandCode::DIRECTORY_CONTENTS_REQUEST, &metadata, &()).await
    }

    /// Renames `directory_id` to `new_name`.
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn rename_directory(&mut self, directory_id: &str, new_name: &str) -> Result<DirectoryRenameResponseBody, ClientError> {
        let body = DirectoryRenameRequestBody { new_name: new_name.to_string() };
        let metadata = [("DirectoryId", directory_id.to_string())];
        self.call(CommandCode::DIRECTORY_RENAME_REQUEST, &metadata, &body).await
    }

    /// Deletes `directory_id`, recursively if `recursive` is set.
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn delete_directory(&mut self, directory_id: &str, recursive: bool) -> Result<AckResponseBody, ClientError> {
        let metadata = [("DirectoryId", directory_id.to_string()), ("Recursive", recursive.to_string())];
        self.call(CommandCode::DIRECTORY_DELETE_REQUEST, &metadata, &()).await
    }

    /// Moves `file_ids` into `target_directory_id` (root if `None`).
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn move_files(&mut self, file_ids: &[String], target_directory_id: Option<&str>) -> Result<FileMoveResponseBody, ClientError> {
        let body = FileMoveRequestBody { file_ids: file_ids.to_vec() };
        let metadata = target_directory_id.map(|id| ("DirectoryId", id.to_string())).into_iter().collect::<Vec<_>>();
        self.call(CommandCode::FILE_MOVE_REQUEST, &metadata, &body).await
    }

    /// Lists files visible under `directory_id` (root if `None`).
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn list_files(&mut self, directory_id: Option<&str>) -> Result<FileListResponseBody, ClientError> {
        let metadata = directory_id.map(|id| ("DirectoryId", id.to_string())).into_iter().collect::<Vec<_>>();
        self.call(CommandCode::FILE_LIST_REQUEST, &metadata, &()).await
    }

    /// Deletes `file_id`.
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn delete_file(&mut self, file_id: &str) -> Result<AckResponseBody, ClientError> {
        let metadata = [("FileId", file_id.to_string())];
        self.call(CommandCode::FILE_DELETE_REQUEST, &metadata, &()).await
    }

    /// Uploads `data` as a new file named `file_name` under `directory_id`
    /// (root if `None`), splitting it into `chunk_size`-byte chunks.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] if initialization or any chunk is
    /// refused, or a connection/protocol error.
    pub async fn upload(
        &mut self,
        file_name: &str,
        content_type: &str,
        data: &[u8],
        directory_id: Option<&str>,
        chunk_size: usize,
    ) -> Result<String, ClientError> {
        let init = self.upload_init(file_name, content_type, data.len() as u64, directory_id).await?;

        let chunks: Vec<&[u8]> = data.chunks(chunk_size.max(1)).collect();
        let total = chunks.len();
        for (index, chunk) in chunks.into_iter().enumerate() {
            let is_last_chunk = index + 1 == total;
            let ack = self.upload_chunk(&init.file_id, index as u64, chunk, is_last_chunk).await?;
            if !ack.success {
                return Err(ClientError::Rejected(ack.message));
            }
        }

        self.upload_complete(&init.file_id).await?;
        Ok(init.file_id)
    }

    /// Initializes a chunked upload, without sending any chunks. Exposed so
    /// tests can drive chunk ordering explicitly.
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn upload_init(
        &mut self,
        file_name: &str,
        content_type: &str,
        file_size: u64,
        directory_id: Option<&str>,
    ) -> Result<UploadInitResponseBody, ClientError> {
        let body = UploadInitRequestBody { file_name: file_name.to_string(), file_size, content_type: content_type.to_string() };
        let metadata = directory_id.map(|id| ("DirectoryId", id.to_string())).into_iter().collect::<Vec<_>>();
        self.call(CommandCode::UPLOAD_INIT_REQUEST, &metadata, &body).await
    }

    /// Sends one upload chunk at `index`, returning the server's
    /// acknowledgement (which reports rejection rather than erroring, so
    /// callers can assert on out-of-order behavior). `is_last_chunk` is the
    /// advisory early-completion flag: set it when the caller already knows
    /// this is the final chunk, to let the server mark the file complete
    /// without a separate `upload_complete` round trip.
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn upload_chunk(
        &mut self,
        file_id: &str,
        index: u64,
        chunk: &[u8],
        is_last_chunk: bool,
    ) -> Result<AckResponseBody, ClientError> {
        let packet = Packet::new(CommandCode::UPLOAD_CHUNK_REQUEST, Uuid::new_v4(), self.user_id.clone(), 0)
            .with_metadata("FileId", file_id)
            .with_metadata("ChunkIndex", index.to_string())
            .with_metadata("IsLastChunk", is_last_chunk.to_string())
            .with_payload(Bytes::copy_from_slice(chunk));
        self.send(packet).await?;

        let response = self.recv().await?;
        if response.command == CommandCode::ERROR {
            let error: ErrorResponseBody = decode_body(response.command, &response.payload)?;
            return Err(ClientError::Rejected(error.message));
        }
        Ok(decode_body(response.command, &response.payload)?)
    }

    /// Finalizes a chunked upload.
    ///
    /// # Errors
    ///
    /// See [`Self::login`].
    pub async fn upload_complete(&mut self, file_id: &str) -> Result<AckResponseBody, ClientError> {
        let metadata = [("FileId", file_id.to_string())];
        let ack: AckResponseBody = self.call(CommandCode::UPLOAD_COMPLETE_REQUEST, &metadata, &()).await?;
        if !ack.success {
            return Err(ClientError::Rejected(ack.message));
        }
        Ok(ack)
    }

    /// Downloads the complete contents of `file_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] if the file cannot be opened for
    /// download, or a connection/protocol error.
    pub async fn download(&mut self, file_id: &str) -> Result<Vec<u8>, ClientError> {
        let metadata = [("FileId", file_id.to_string())];
        let init: DownloadInitResponseBody = self.call(CommandCode::DOWNLOAD_INIT_REQUEST, &metadata, &()).await?;
        if !init.success {
            return Err(ClientError::Rejected(init.message));
        }

        let mut data = Vec::with_capacity(init.file_size as usize);
        for index in 0..init.total_chunks {
            let packet = Packet::new(CommandCode::DOWNLOAD_CHUNK_REQUEST, Uuid::new_v4(), self.user_id.clone(), 0)
                .with_metadata("FileId", file_id)
                .with_metadata("ChunkIndex", index.to_string());
            self.send(packet).await?;
            let response = self.recv().await?;
            if response.command == CommandCode::ERROR {
                let error: ErrorResponseBody = decode_body(response.command, &response.payload)?;
                return Err(ClientError::Rejected(error.message));
            }
            data.extend_from_slice(&response.payload);
        }

        let metadata = [("FileId", file_id.to_string())];
        let ack: AckResponseBody = self.call(CommandCode::DOWNLOAD_COMPLETE_REQUEST, &metadata, &()).await?;
        if !ack.success {
            return Err(ClientError::Rejected(ack.message));
        }

        Ok(data)
    }
}
