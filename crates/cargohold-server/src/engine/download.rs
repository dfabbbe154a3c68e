//! Download engine: the three-phase `Initialize` / `GetChunk` / `Complete`
//! sequence, reading back what the upload engine wrote.

use crate::catalog::{FileCatalog, FileRecord};
use crate::error::ServerError;
use crate::storage::Storage;

/// Coordinates chunked downloads against a [`FileCatalog`] and [`Storage`]
/// backend.
pub struct DownloadEngine<S: Storage> {
    storage: S,
}

impl<S: Storage> DownloadEngine<S> {
    /// Creates a new download engine over `storage`.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// `Initialize`: resolves the file and reports its size and chunk count.
    ///
    /// # Errors
    ///
    /// - [`ServerError::NotFound`] if `file_id` does not resolve for `owner`.
    /// - [`ServerError::Conflict`] if the file's upload has not finished.
    pub fn initialize(&self, files: &FileCatalog<S>, owner: &str, file_id: &str) -> Result<FileRecord, ServerError> {
        let record = files.get(file_id, owner)?;
        if !record.is_complete {
            return Err(ServerError::Conflict(format!("file {file_id} is still uploading")));
        }
        Ok(record)
    }

    /// `GetChunk`: reads one chunk at `index` from physical storage.
    ///
    /// # Errors
    ///
    /// - [`ServerError::NotFound`] if `file_id` does not resolve for `owner`.
    /// - [`ServerError::Conflict`] if `index` is beyond the file's chunk
    ///   count.
    /// - [`ServerError::Storage`] if the read fails.
    pub fn get_chunk(
        &self,
        files: &FileCatalog<S>,
        owner: &str,
        file_id: &str,
        index: u64,
        chunk_size: u64,
    ) -> Result<(Vec<u8>, bool), ServerError> {
        let record = files.get(file_id, owner)?;
        if index >= record.total_chunks {
            return Err(ServerError::Conflict(format!("chunk index {index} out of range")));
        }

        let offset = index * chunk_size;
        let remaining = record.size.saturating_sub(offset);
        let len = remaining.min(chunk_size) as usize;

        let bytes = self.storage.read_chunk(&record.physical_path, offset, len)?;
        let is_last = index + 1 == record.total_chunks;
        Ok((bytes, is_last))
    }

    /// `Complete`: no catalog state to mutate; download completion is purely
    /// a protocol acknowledgement, kept here for symmetry with the upload
    /// engine's phase naming.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotFound`] if `file_id` does not resolve for
    /// `owner`.
    pub fn complete(&self, files: &FileCatalog<S>, owner: &str, file_id: &str) -> Result<(), ServerError> {
        files.get(file_id, owner).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::storage::MemoryStorage;

    use super::*;
    use crate::engine::upload::UploadEngine;
    use crate::catalog::DirectoryCatalog;

    #[test]
    fn reads_back_chunks_written_by_upload() {
        let storage = MemoryStorage::new();
        let files = FileCatalog::new(storage.clone(), PathBuf::from("/meta/files.json"));
        let directories = DirectoryCatalog::new(storage.clone(), PathBuf::from("/root"), PathBuf::from("/meta/directories.json"));
        let uploader = UploadEngine::new(storage.clone());
        let downloader = DownloadEngine::new(storage);

        let record = uploader.initialize(&files, &directories, "alice", None, "a.bin", 6, "application/octet-stream", 4, 0).unwrap();
        uploader.append_chunk(&files, "alice", &record.id, 0, b"abcd", 4, false, 1).unwrap();
        uploader.append_chunk(&files, "alice", &record.id, 1, b"ef", 4, false, 2).unwrap();
        uploader.finalize(&files, "alice", &record.id, 3).unwrap();

        downloader.initialize(&files, "alice", &record.id).unwrap();
        let (chunk0, last0) = downloader.get_chunk(&files, "alice", &record.id, 0, 4).unwrap();
        assert_eq!(chunk0, b"abcd");
        assert!(!last0);

        let (chunk1, last1) = downloader.get_chunk(&files, "alice", &record.id, 1, 4).unwrap();
        assert_eq!(chunk1, b"ef");
        assert!(last1);
    }

    #[test]
    fn initialize_rejects_incomplete_upload() {
        let storage = MemoryStorage::new();
        let files = FileCatalog::new(storage.clone(), PathBuf::from("/meta/files.json"));
        let directories = DirectoryCatalog::new(storage.clone(), PathBuf::from("/root"), PathBuf::from("/meta/directories.json"));
        let uploader = UploadEngine::new(storage.clone());
        let downloader = DownloadEngine::new(storage);

        let record = uploader.initialize(&files, &directories, "alice", None, "a.bin", 6, "application/octet-stream", 4, 0).unwrap();
        let err = downloader.initialize(&files, "alice", &record.id).unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
    }
}
