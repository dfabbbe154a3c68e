//! File catalog: per-user file metadata, independent of upload/download
//! chunk mechanics (owned by the engine modules).

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};

use serde::{Deserialize, Serialize};

use crate::error::ServerError;
use crate::storage::Storage;

use super::sanitize_name;

/// A stored file's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Opaque file id.
    pub id: String,
    /// Owning user id.
    pub owner: String,
    /// Sanitized file name.
    pub name: String,
    /// Directory containing this file; `None` means the user's root.
    pub directory_id: Option<String>,
    /// Total size in bytes, known at `Initialize` time.
    pub size: u64,
    /// Client-supplied content type.
    pub content_type: String,
    /// Absolute physical path backing this file.
    pub physical_path: PathBuf,
    /// Number of chunks the upload declared it would send.
    pub total_chunks: u64,
    /// Index of the next chunk expected, for strict-ordering enforcement.
    pub next_chunk_index: u64,
    /// True once every chunk has been appended and finalized.
    pub is_complete: bool,
    /// Creation timestamp, epoch-nanoseconds.
    pub created_at: i64,
    /// Last-update timestamp, epoch-nanoseconds.
    pub updated_at: i64,
}

/// A read-only view of a file record, as returned by directory listings.
pub type FileRecordView = FileRecord;

/// The in-memory, JSON-snapshot-persisted index of file metadata.
pub struct FileCatalog<S: Storage> {
    records: RwLock<HashMap<String, FileRecord>>,
    storage: S,
    metadata_path: PathBuf,
    next_id: RwLock<u64>,
}

impl<S: Storage> FileCatalog<S> {
    /// Creates an empty catalog, persisting snapshots to `metadata_path`.
    #[must_use]
    pub fn new(storage: S, metadata_path: PathBuf) -> Self {
        Self { records: RwLock::new(HashMap::new()), storage, metadata_path, next_id: RwLock::new(0) }
    }

    /// Loads a catalog from an existing JSON snapshot, or an empty one if
    /// `metadata_path` does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Internal`] if the snapshot exists but is not
    /// valid JSON.
    pub fn load(storage: S, metadata_path: PathBuf) -> Result<Self, ServerError> {
        let records = match std::fs::read(&metadata_path) {
            Ok(bytes) => serde_json::from_slice::<Vec<FileRecord>>(&bytes)
                .map_err(|err| ServerError::Internal(format!("corrupt files.json: {err}")))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(ServerError::Internal(err.to_string())),
        };

        let next_id = records
            .iter()
            .filter_map(|r| r.id.strip_prefix('f').and_then(|n| n.parse::<u64>().ok()))
            .max()
            .unwrap_or(0);

        let map = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Ok(Self { records: RwLock::new(map), storage, metadata_path, next_id: RwLock::new(next_id) })
    }

    #[allow(clippy::expect_used)]
    fn persist(&self) -> Result<(), ServerError> {
        let records = self.records.read().expect("file catalog lock poisoned");
        let values: Vec<&FileRecord> = records.values().collect();
        let bytes = serde_json::to_vec_pretty(&values)
            .map_err(|err| ServerError::Internal(format!("failed to serialize catalog: {err}")))?;
        if let Some(parent) = self.metadata_path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| ServerError::Internal(err.to_string()))?;
        }
        std::fs::write(&self.metadata_path, bytes).map_err(|err| ServerError::Internal(err.to_string()))
    }

    /// Looks up a file by id, verifying ownership.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotFound`] if the id does not resolve for
    /// `owner`.
    #[allow(clippy::expect_used)]
    pub fn get(&self, id: &str, owner: &str) -> Result<FileRecord, ServerError> {
        let records = self.records.read().expect("file catalog lock poisoned");
        records.get(id).filter(|r| r.owner == owner).cloned().ok_or_else(|| ServerError::NotFound(format!("file {id}")))
    }

    /// True if a sibling with `name` (case-insensitive) already exists in
    /// `directory_id` for `owner`.
    #[allow(clippy::expect_used)]
    pub fn exists_with_name(&self, owner: &str, directory_id: Option<&str>, name: &str) -> bool {
        let records = self.records.read().expect("file catalog lock poisoned");
        let lowered = name.to_lowercase();
        records.values().any(|r| {
            r.owner == owner && r.directory_id.as_deref() == directory_id && r.name.to_lowercase() == lowered
        })
    }

    /// Registers a new, empty file and creates its backing physical file.
    /// Used by the upload engine's `Initialize` phase.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Conflict`] if a sibling with the same
    ///   case-insensitive name already exists in the directory.
    /// - [`ServerError::Storage`] if the physical file cannot be created.
    #[allow(clippy::expect_used, clippy::too_many_arguments)]
    pub fn create(
        &self,
        owner: &str,
        name: &str,
        directory_path: &Path,
        directory_id: Option<&str>,
        size: u64,
        content_type: &str,
        total_chunks: u64,
        now_nanos: i64,
    ) -> Result<FileRecord, ServerError> {
        let sanitized = sanitize_name(name);

        if self.exists_with_name(owner, directory_id, &sanitized) {
            return Err(ServerError::Conflict(format!("file '{sanitized}' already exists")));
        }

        let id = {
            let mut next_id = self.next_id.write().expect("file catalog lock poisoned");
            *next_id += 1;
            format!("f{next_id}")
        };

        let physical_path = super::super::storage::file_path(directory_path, &id, &sanitized);
        self.storage.create_empty_file(&physical_path)?;

        let record = FileRecord {
            id: id.clone(),
            owner: owner.to_string(),
            name: sanitized,
            directory_id: directory_id.map(str::to_string),
            size,
            content_type: content_type.to_string(),
            physical_path,
            total_chunks,
            next_chunk_index: 0,
            is_complete: false,
            created_at: now_nanos,
            updated_at: now_nanos,
        };

        {
            let mut records = self.records.write().expect("file catalog lock poisoned");
            records.insert(id, record.clone());
        }

        if let Err(err) = self.persist() {
            let mut records = self.records.write().expect("file catalog lock poisoned");
            records.remove(&record.id);
            let _ = self.storage.delete_file(&record.physical_path);
            return Err(err);
        }

        Ok(record)
    }

    /// Advances `next_chunk_index` after a chunk has been durably written.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotFound`] if `id` does not resolve for
    /// `owner`.
    #[allow(clippy::expect_used)]
    pub fn advance_chunk(&self, id: &str, owner: &str, now_nanos: i64) -> Result<u64, ServerError> {
        let mut records = self.records.write().expect("file catalog lock poisoned");
        let record = records
            .get_mut(id)
            .filter(|r| r.owner == owner)
            .ok_or_else(|| ServerError::NotFound(format!("file {id}")))?;
        record.next_chunk_index += 1;
        record.updated_at = now_nanos;
        let index = record.next_chunk_index;
        drop(records);
        self.persist()?;
        Ok(index)
    }

    /// Marks a file complete. Used by the upload engine's `Finalize` phase.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotFound`] if `id` does not resolve for
    /// `owner`.
    #[allow(clippy::expect_used)]
    pub fn mark_complete(&self, id: &str, owner: &str, now_nanos: i64) -> Result<FileRecord, ServerError> {
        let mut records = self.records.write().expect("file catalog lock poisoned");
        let record = records
            .get_mut(id)
            .filter(|r| r.owner == owner)
            .ok_or_else(|| ServerError::NotFound(format!("file {id}")))?;
        record.is_complete = true;
        record.updated_at = now_nanos;
        let result = record.clone();
        drop(records);
        self.persist()?;
        Ok(result)
    }

    /// Lists the files directly contained in `directory_id` (or the user's
    /// root if `None`).
    #[allow(clippy::expect_used)]
    pub fn list_in_directory(&self, directory_id: Option<&str>, owner: &str) -> Vec<FileRecordView> {
        let records = self.records.read().expect("file catalog lock poisoned");
        let mut files: Vec<FileRecord> = records
            .values()
            .filter(|r| r.owner == owner && r.directory_id.as_deref() == directory_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        files
    }

    /// Deletes a single file, both metadata and physical bytes.
    ///
    /// # Errors
    ///
    /// - [`ServerError::NotFound`] if `id` does not resolve for `owner`.
    /// - [`ServerError::Storage`] if physical deletion fails.
    #[allow(clippy::expect_used)]
    pub fn delete(&self, id: &str, owner: &str) -> Result<(), ServerError> {
        let record = self.get(id, owner)?;
        self.storage.delete_file(&record.physical_path)?;
        let mut records = self.records.write().expect("file catalog lock poisoned");
        records.remove(id);
        drop(records);
        self.persist()
    }

    /// Deletes every file owned by `owner` directly inside `directory_id`,
    /// used when a directory is deleted recursively. Best-effort: physical
    /// deletion failures are ignored since the containing directory itself
    /// is about to be removed wholesale.
    #[allow(clippy::expect_used)]
    pub fn delete_all_in_directory(&self, directory_id: &str, owner: &str) {
        let ids: Vec<String> = {
            let records = self.records.read().expect("file catalog lock poisoned");
            records
                .values()
                .filter(|r| r.owner == owner && r.directory_id.as_deref() == Some(directory_id))
                .map(|r| r.id.clone())
                .collect()
        };
        let mut records = self.records.write().expect("file catalog lock poisoned");
        for id in ids {
            if let Some(record) = records.remove(&id) {
                let _ = self.storage.delete_file(&record.physical_path);
            }
        }
    }

    /// Rewrites the stored physical path of every file under `old_root` to
    /// be rooted at `new_root` instead, following a directory rename.
    #[allow(clippy::expect_used)]
    pub fn rewrite_paths_under(&self, old_root: &Path, new_root: &Path, now_nanos: i64) {
        let mut records = self.records.write().expect("file catalog lock poisoned");
        for record in records.values_mut() {
            if let Ok(suffix) = record.physical_path.strip_prefix(old_root) {
                record.physical_path = new_root.join(suffix);
                record.updated_at = now_nanos;
            }
        }
        drop(records);
        let _ = self.persist();
    }

    /// Moves a set of files into `target_directory_id`, de-duplicating any
    /// name collision in the destination with a timestamp suffix. Partial
    /// failures leave already-moved files moved; the caller receives the
    /// count that actually succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotFound`] if any id does not resolve for
    /// `owner`.
    #[allow(clippy::expect_used)]
    pub fn move_files(
        &self,
        file_ids: &[String],
        owner: &str,
        target_directory_id: Option<&str>,
        target_directory_path: &Path,
        now_nanos: i64,
    ) -> Result<u64, ServerError> {
        let mut moved = 0u64;
        for file_id in file_ids {
            let record = self.get(file_id, owner)?;

            let mut name = record.name.clone();
            if self.exists_with_name(owner, target_directory_id, &name) {
                name = format!("{now_nanos}_{name}");
            }

            let new_path = super::super::storage::file_path(target_directory_path, &record.id, &name);
            self.storage.move_file(&record.physical_path, &new_path)?;

            let mut records = self.records.write().expect("file catalog lock poisoned");
            if let Some(stored) = records.get_mut(file_id) {
                stored.physical_path = new_path;
                stored.name = name;
                stored.directory_id = target_directory_id.map(str::to_string);
                stored.updated_at = now_nanos;
            }
            drop(records);
            moved += 1;
        }
        self.persist()?;
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::MemoryStorage;

    use super::*;

    fn catalog() -> FileCatalog<MemoryStorage> {
        FileCatalog::new(MemoryStorage::new(), PathBuf::from("/meta/files.json"))
    }

    #[test]
    fn create_rejects_duplicate_sibling_name() {
        let files = catalog();
        files.create("alice", "a.txt", Path::new("/root/alice"), None, 10, "text/plain", 1, 0).unwrap();
        let err = files.create("alice", "A.txt", Path::new("/root/alice"), None, 10, "text/plain", 1, 1).unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
    }

    #[test]
    fn advance_chunk_and_mark_complete() {
        let files = catalog();
        let record = files.create("alice", "a.txt", Path::new("/root/alice"), None, 10, "text/plain", 2, 0).unwrap();
        assert_eq!(files.advance_chunk(&record.id, "alice", 1).unwrap(), 1);
        assert_eq!(files.advance_chunk(&record.id, "alice", 2).unwrap(), 2);
        let completed = files.mark_complete(&record.id, "alice", 3).unwrap();
        assert!(completed.is_complete);
    }

    #[test]
    fn move_files_deduplicates_colliding_names() {
        let files = catalog();
        let source = files.create("alice", "a.txt", Path::new("/root/alice/src"), Some("d1"), 5, "text/plain", 1, 0).unwrap();
        files.create("alice", "a.txt", Path::new("/root/alice/dst"), Some("d2"), 5, "text/plain", 1, 0).unwrap();

        let moved = files
            .move_files(&[source.id.clone()], "alice", Some("d2"), Path::new("/root/alice/dst"), 99)
            .unwrap();
        assert_eq!(moved, 1);

        let moved_record = files.get(&source.id, "alice").unwrap();
        assert_ne!(moved_record.name, "a.txt");
        assert_eq!(moved_record.directory_id.as_deref(), Some("d2"));
    }
}
