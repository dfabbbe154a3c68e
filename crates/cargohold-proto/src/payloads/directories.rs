//! Payload bodies for the directory commands (240-251).
//!
//! `DirectoryId`, `ParentDirectoryId`, and `Recursive` travel in packet
//! metadata rather than in these bodies.

use serde::{Deserialize, Serialize};

use super::files::FileSummary;

/// One directory's metadata as surfaced in a listing response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySummary {
    /// Directory id.
    #[serde(rename = "DirectoryId")]
    pub directory_id: String,
    /// Sanitized directory name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Parent directory id, empty for a root-level directory.
    #[serde(
        rename = "ParentDirectoryId",
        skip_serializing_if = "String::is_empty",
        default
    )]
    pub parent_directory_id: String,
    /// Creation timestamp, epoch-nanoseconds.
    #[serde(rename = "CreatedAt")]
    pub created_at: i64,
    /// Last-update timestamp, epoch-nanoseconds.
    #[serde(rename = "UpdatedAt")]
    pub updated_at: i64,
}

/// Body of a `DirectoryCreateRequest` (command 240).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryCreateRequestBody {
    /// Requested directory name, sanitized by the catalog before storage.
    #[serde(rename = "DirectoryName")]
    pub directory_name: String,
}

/// Body of a `DirectoryCreateResponse` (command 241).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryCreateResponseBody {
    /// Whether the directory was created.
    #[serde(rename = "Success")]
    pub success: bool,
    /// Human-readable status or failure reason.
    #[serde(rename = "Message")]
    pub message: String,
    /// The new directory's id, empty on failure.
    #[serde(rename = "DirectoryId", skip_serializing_if = "String::is_empty", default)]
    pub directory_id: String,
}

/// Body of a `DirectoryListResponse` (command 243).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DirectoryListResponseBody {
    /// Subdirectories of the requested directory.
    #[serde(rename = "Directories")]
    pub directories: Vec<DirectorySummary>,
}

/// Body of a `DirectoryRenameRequest` (command 244).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRenameRequestBody {
    /// New name for the directory, sanitized before storage.
    #[serde(rename = "NewName")]
    pub new_name: String,
}

/// Body of a `DirectoryRenameResponse` (command 245).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRenameResponseBody {
    /// Whether the directory was renamed.
    #[serde(rename = "Success")]
    pub success: bool,
    /// Human-readable status or failure reason.
    #[serde(rename = "Message")]
    pub message: String,
}

/// Body of a `FileMoveRequest` (command 248).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMoveRequestBody {
    /// Ids of the files to move; each is validated for ownership.
    #[serde(rename = "FileIds")]
    pub file_ids: Vec<String>,
}

/// Body of a `FileMoveResponse` (command 249).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMoveResponseBody {
    /// Whether every file in the request was moved.
    #[serde(rename = "Success")]
    pub success: bool,
    /// Human-readable status or failure reason.
    #[serde(rename = "Message")]
    pub message: String,
    /// Number of files actually moved.
    #[serde(rename = "MovedCount")]
    pub moved_count: u64,
}

/// Body of a `DirectoryContentsResponse` (command 251).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DirectoryContentsResponseBody {
    /// Subdirectories of the requested directory.
    #[serde(rename = "Directories")]
    pub directories: Vec<DirectorySummary>,
    /// Files directly inside the requested directory.
    #[serde(rename = "Files")]
    pub files: Vec<FileSummary>,
}
