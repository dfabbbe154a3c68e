//! Upload engine: the three-phase `Initialize` / `AppendChunk` / `Finalize`
//! sequence, grounded in the file catalog's chunk-order bookkeeping.

use crate::catalog::{DirectoryCatalog, FileCatalog, FileRecord};
use crate::error::ServerError;
use crate::storage::Storage;

/// Coordinates chunked uploads against a [`FileCatalog`] and [`Storage`]
/// backend. Holds no state of its own; every call is self-contained and
/// safe to invoke from any session's task since the catalogs serialize
/// their own mutations.
pub struct UploadEngine<S: Storage> {
    storage: S,
}

impl<S: Storage> UploadEngine<S> {
    /// Creates a new upload engine over `storage`.
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// `Initialize`: registers the file's metadata and creates its empty
    /// backing physical file.
    ///
    /// # Errors
    ///
    /// - [`ServerError::NotFound`] if `directory_id` is given but does not
    ///   resolve for `owner`.
    /// - [`ServerError::Conflict`] if a sibling with the same name exists.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        &self,
        files: &FileCatalog<S>,
        directories: &DirectoryCatalog<S>,
        owner: &str,
        directory_id: Option<&str>,
        file_name: &str,
        file_size: u64,
        content_type: &str,
        chunk_size: u64,
        now_nanos: i64,
    ) -> Result<FileRecord, ServerError> {
        let directory_path = match directory_id {
            Some(id) => directories.get(id, owner)?.physical_path,
            None => directories.root_path(owner),
        };

        let total_chunks = file_size.div_ceil(chunk_size).max(1);

        files.create(owner, file_name, &directory_path, directory_id, file_size, content_type, total_chunks, now_nanos)
    }

    /// `AppendChunk`: writes one chunk and advances the expected index.
    ///
    /// A chunk is accepted only if `index` equals the file's next expected
    /// index; any other value is rejected as out of order, since the wire
    /// protocol guarantees in-order delivery over a single connection and an
    /// out-of-order chunk indicates a client or transport bug. A short final
    /// chunk (file size not an exact multiple of the chunk size) is accepted
    /// whenever `index == total_chunks - 1`, independent of `is_last_chunk`.
    /// `is_last_chunk` is the advisory early-completion signal: when set, the
    /// file is marked complete immediately, even if fewer than `total_chunks`
    /// chunks have been received, for a client that knows its own chunk
    /// count and wants to skip a separate `Finalize` round trip.
    ///
    /// # Errors
    ///
    /// - [`ServerError::NotFound`] if `file_id` does not resolve for `owner`.
    /// - [`ServerError::OutOfOrderChunk`] if `index` is not the expected one.
    /// - [`ServerError::Storage`] if the write fails.
    #[allow(clippy::too_many_arguments)]
    pub fn append_chunk(
        &self,
        files: &FileCatalog<S>,
        owner: &str,
        file_id: &str,
        index: u64,
        bytes: &[u8],
        chunk_size: u64,
        is_last_chunk: bool,
        now_nanos: i64,
    ) -> Result<bool, ServerError> {
        let record = files.get(file_id, owner)?;

        if index != record.next_chunk_index {
            return Err(ServerError::OutOfOrderChunk { expected: record.next_chunk_index, got: index });
        }

        let offset = index * chunk_size;
        self.storage.write_chunk(&record.physical_path, offset, bytes)?;
        let next_index = files.advance_chunk(file_id, owner, now_nanos)?;

        let is_last = next_index >= record.total_chunks || is_last_chunk;
        if is_last {
            files.mark_complete(file_id, owner, now_nanos)?;
        }
        Ok(is_last)
    }

    /// `Finalize`: requires every chunk to have been received, then marks
    /// the file complete. Idempotent at the catalog level (re-finalizing an
    /// already-complete file is not distinguished here).
    ///
    /// # Errors
    ///
    /// - [`ServerError::NotFound`] if `file_id` does not resolve for `owner`.
    /// - [`ServerError::Conflict`] if fewer than `total_chunks` chunks have
    ///   been received.
    pub fn finalize(&self, files: &FileCatalog<S>, owner: &str, file_id: &str, now_nanos: i64) -> Result<FileRecord, ServerError> {
        let record = files.get(file_id, owner)?;
        if record.next_chunk_index < record.total_chunks {
            return Err(ServerError::Conflict(format!(
                "cannot finalize {file_id}: {} of {} chunks received",
                record.next_chunk_index, record.total_chunks
            )));
        }

        match self.storage.file_size(&record.physical_path) {
            Ok(actual) if actual != record.size => {
                tracing::warn!("finalize {file_id}: on-disk size {actual} does not match declared size {}", record.size);
            },
            Ok(_) => {},
            Err(err) => tracing::warn!("finalize {file_id}: failed to read on-disk size: {err}"),
        }

        files.mark_complete(file_id, owner, now_nanos)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::storage::MemoryStorage;

    use super::*;

    fn setup() -> (UploadEngine<MemoryStorage>, FileCatalog<MemoryStorage>, DirectoryCatalog<MemoryStorage>) {
        let storage = MemoryStorage::new();
        let files = FileCatalog::new(storage.clone(), PathBuf::from("/meta/files.json"));
        let directories = DirectoryCatalog::new(storage.clone(), PathBuf::from("/root"), PathBuf::from("/meta/directories.json"));
        (UploadEngine::new(storage), files, directories)
    }

    #[test]
    fn full_upload_sequence_succeeds() {
        let (engine, files, directories) = setup();
        let record = engine.initialize(&files, &directories, "alice", None, "a.bin", 10, "application/octet-stream", 4, 0).unwrap();
        assert_eq!(record.total_chunks, 3);

        assert!(!engine.append_chunk(&files, "alice", &record.id, 0, &[0u8; 4], 4, false, 1).unwrap());
        assert!(!engine.append_chunk(&files, "alice", &record.id, 1, &[0u8; 4], 4, false, 2).unwrap());
        assert!(engine.append_chunk(&files, "alice", &record.id, 2, &[0u8; 2], 4, false, 3).unwrap());

        let finalized = engine.finalize(&files, "alice", &record.id, 4).unwrap();
        assert!(finalized.is_complete);
    }

    #[test]
    fn out_of_order_chunk_is_rejected() {
        let (engine, files, directories) = setup();
        let record = engine.initialize(&files, &directories, "alice", None, "a.bin", 10, "application/octet-stream", 4, 0).unwrap();

        let err = engine.append_chunk(&files, "alice", &record.id, 1, &[0u8; 4], 4, false, 1).unwrap_err();
        assert!(matches!(err, ServerError::OutOfOrderChunk { expected: 0, got: 1 }));
    }

    #[test]
    fn is_last_chunk_flag_completes_upload_early() {
        let (engine, files, directories) = setup();
        let record = engine.initialize(&files, &directories, "alice", None, "a.bin", 10, "application/octet-stream", 4, 0).unwrap();

        assert!(engine.append_chunk(&files, "alice", &record.id, 0, &[0u8; 4], 4, true, 1).unwrap());
        let stored = files.get(&record.id, "alice").unwrap();
        assert!(stored.is_complete);
    }

    #[test]
    fn finalize_rejects_incomplete_upload() {
        let (engine, files, directories) = setup();
        let record = engine.initialize(&files, &directories, "alice", None, "a.bin", 10, "application/octet-stream", 4, 0).unwrap();

        let err = engine.finalize(&files, "alice", &record.id, 1).unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
        assert!(!files.get(&record.id, "alice").unwrap().is_complete);
    }

    #[test]
    fn finalize_succeeds_once_every_chunk_is_received() {
        let (engine, files, directories) = setup();
        let record = engine.initialize(&files, &directories, "alice", None, "a.bin", 10, "application/octet-stream", 4, 0).unwrap();

        engine.append_chunk(&files, "alice", &record.id, 0, &[0u8; 4], 4, false, 1).unwrap();
        engine.append_chunk(&files, "alice", &record.id, 1, &[0u8; 4], 4, false, 2).unwrap();
        engine.append_chunk(&files, "alice", &record.id, 2, &[0u8; 2], 4, false, 3).unwrap();

        let finalized = engine.finalize(&files, "alice", &record.id, 4).unwrap();
        assert!(finalized.is_complete);
    }
}
