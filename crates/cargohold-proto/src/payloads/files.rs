//! Payload bodies for the file commands (200-231).
//!
//! `ChunkIndex`, `FileId`, `IsLastChunk`, and `DirectoryId` travel in packet
//! metadata rather than in these bodies - see the module docs for the full
//! metadata/body split.

use serde::{Deserialize, Serialize};

/// One file's metadata as surfaced in a listing response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    /// File id.
    #[serde(rename = "FileId")]
    pub file_id: String,
    /// Display name as given at upload time.
    #[serde(rename = "FileName")]
    pub file_name: String,
    /// Declared total size in bytes.
    #[serde(rename = "FileSize")]
    pub file_size: u64,
    /// Client-declared content type.
    #[serde(rename = "ContentType")]
    pub content_type: String,
    /// Containing directory id, empty for root.
    #[serde(rename = "DirectoryId", skip_serializing_if = "String::is_empty", default)]
    pub directory_id: String,
    /// Whether the upload has been finalized.
    #[serde(rename = "IsComplete")]
    pub is_complete: bool,
    /// Creation timestamp, epoch-nanoseconds.
    #[serde(rename = "CreatedAt")]
    pub created_at: i64,
    /// Last-update timestamp, epoch-nanoseconds.
    #[serde(rename = "UpdatedAt")]
    pub updated_at: i64,
}

/// Body of a `FileListResponse` (command 201).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FileListResponseBody {
    /// Files owned by the caller under the requested directory.
    #[serde(rename = "Files")]
    pub files: Vec<FileSummary>,
}

/// Body of an `UploadInitRequest` (command 210).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadInitRequestBody {
    /// Display name for the new file.
    #[serde(rename = "FileName")]
    pub file_name: String,
    /// Total declared size in bytes; must be greater than zero.
    #[serde(rename = "FileSize")]
    pub file_size: u64,
    /// Client-declared content type, stored but not validated.
    #[serde(rename = "ContentType")]
    pub content_type: String,
}

/// Body of an `UploadInitResponse` (command 211).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadInitResponseBody {
    /// Whether the upload could be initialized.
    #[serde(rename = "Success")]
    pub success: bool,
    /// Human-readable status or failure reason.
    #[serde(rename = "Message")]
    pub message: String,
    /// The new file's id, empty on failure.
    #[serde(rename = "FileId", skip_serializing_if = "String::is_empty", default)]
    pub file_id: String,
}

/// Body shared by `UploadChunkResponse`, `UploadCompleteResponse`,
/// `DownloadCompleteResponse`, and `FileDeleteResponse` - a bare
/// success/message acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponseBody {
    /// Whether the operation succeeded.
    #[serde(rename = "Success")]
    pub success: bool,
    /// Human-readable status or failure reason.
    #[serde(rename = "Message")]
    pub message: String,
}

impl AckResponseBody {
    /// Builds a successful acknowledgement with `message`.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    /// Builds a failed acknowledgement with `message`.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// Body of a `DownloadInitResponse` (command 221).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadInitResponseBody {
    /// Whether the file could be opened for download.
    #[serde(rename = "Success")]
    pub success: bool,
    /// Human-readable status or failure reason.
    #[serde(rename = "Message")]
    pub message: String,
    /// Declared file size in bytes.
    #[serde(rename = "FileSize")]
    pub file_size: u64,
    /// Number of chunks the client should request.
    #[serde(rename = "TotalChunks")]
    pub total_chunks: u64,
}
