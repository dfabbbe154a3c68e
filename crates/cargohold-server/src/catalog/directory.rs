//! Directory catalog: a per-user tree of directories with uniqueness,
//! ownership, and recursive-delete semantics.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::RwLock,
};

use serde::{Deserialize, Serialize};

use super::{file::FileCatalog, sanitize_name};
use crate::{
    error::ServerError,
    storage::Storage,
};

/// A directory's persisted metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Opaque directory id.
    pub id: String,
    /// Owning user id.
    pub owner: String,
    /// Sanitized directory name.
    pub name: String,
    /// Parent directory id; `None` means this directory is at the root.
    pub parent_id: Option<String>,
    /// Absolute physical path backing this directory.
    pub physical_path: PathBuf,
    /// Creation timestamp, epoch-nanoseconds.
    pub created_at: i64,
    /// Last-update timestamp, epoch-nanoseconds.
    pub updated_at: i64,
}

/// The in-memory, JSON-snapshot-persisted index of directory metadata.
///
/// Internally serializes every mutation behind a single write lock; a
/// single lock is sufficient because persistence is a copy-on-write
/// snapshot to one document, not a transactional log.
pub struct DirectoryCatalog<S: Storage> {
    records: RwLock<HashMap<String, DirectoryRecord>>,
    storage: S,
    storage_root: PathBuf,
    metadata_path: PathBuf,
    next_id: RwLock<u64>,
}

impl<S: Storage> DirectoryCatalog<S> {
    /// Creates an empty catalog rooted at `storage_root`, persisting
    /// snapshots to `metadata_path`.
    #[must_use]
    pub fn new(storage: S, storage_root: PathBuf, metadata_path: PathBuf) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            storage,
            storage_root,
            metadata_path,
            next_id: RwLock::new(0),
        }
    }

    /// Loads a catalog from an existing JSON snapshot, or an empty one if
    /// `metadata_path` does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Internal`] if the snapshot exists but is not
    /// valid JSON.
    pub fn load(storage: S, storage_root: PathBuf, metadata_path: PathBuf) -> Result<Self, ServerError> {
        let records = match std::fs::read(&metadata_path) {
            Ok(bytes) => serde_json::from_slice::<Vec<DirectoryRecord>>(&bytes)
                .map_err(|err| ServerError::Internal(format!("corrupt directories.json: {err}")))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(ServerError::Internal(err.to_string())),
        };

        let next_id = records
            .iter()
            .filter_map(|r| r.id.strip_prefix('d').and_then(|n| n.parse::<u64>().ok()))
            .max()
            .unwrap_or(0);

        let map = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Ok(Self {
            records: RwLock::new(map),
            storage,
            storage_root,
            metadata_path,
            next_id: RwLock::new(next_id),
        })
    }

    #[allow(clippy::expect_used)]
    fn persist(&self) -> Result<(), ServerError> {
        let records = self.records.read().expect("directory catalog lock poisoned");
        let values: Vec<&DirectoryRecord> = records.values().collect();
        let bytes = serde_json::to_vec_pretty(&values)
            .map_err(|err| ServerError::Internal(format!("failed to serialize catalog: {err}")))?;
        if let Some(parent) = self.metadata_path.parent() {
            std::fs::create_dir_all(parent).map_err(|err| ServerError::Internal(err.to_string()))?;
        }
        std::fs::write(&self.metadata_path, bytes).map_err(|err| ServerError::Internal(err.to_string()))
    }

    /// The physical path backing a user's root (no directory record of its
    /// own, since the root is implicit rather than catalog-tracked).
    #[must_use]
    pub fn root_path(&self, owner: &str) -> PathBuf {
        self.storage_root.join(owner)
    }

    /// Looks up a directory by id, verifying ownership.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotFound`] if the id does not resolve for
    /// `owner`.
    #[allow(clippy::expect_used)]
    pub fn get(&self, id: &str, owner: &str) -> Result<DirectoryRecord, ServerError> {
        let records = self.records.read().expect("directory catalog lock poisoned");
        records
            .get(id)
            .filter(|r| r.owner == owner)
            .cloned()
            .ok_or_else(|| ServerError::NotFound(format!("directory {id}")))
    }

    /// True if a sibling with `name` (case-insensitive) already exists under
    /// `parent_id` for `owner`.
    #[allow(clippy::expect_used)]
    pub fn exists_with_name(&self, owner: &str, parent_id: Option<&str>, name: &str) -> bool {
        let records = self.records.read().expect("directory catalog lock poisoned");
        let lowered = name.to_lowercase();
        records.values().any(|r| {
            r.owner == owner && r.parent_id.as_deref() == parent_id && r.name.to_lowercase() == lowered
        })
    }

    /// Creates a new directory under `parent_id` (root if `None`).
    ///
    /// # Errors
    ///
    /// - [`ServerError::NotFound`] if `parent_id` is given but does not
    ///   resolve for `owner`.
    /// - [`ServerError::Conflict`] if a sibling with the same
    ///   case-insensitive name already exists.
    /// - [`ServerError::Storage`] if the physical directory cannot be
    ///   created; metadata is never persisted in that case.
    #[allow(clippy::expect_used)]
    pub fn create(
        &self,
        owner: &str,
        name: &str,
        parent_id: Option<&str>,
        now_nanos: i64,
    ) -> Result<DirectoryRecord, ServerError> {
        let sanitized = sanitize_name(name);

        let parent_path = match parent_id {
            Some(id) => Some(self.get(id, owner)?.physical_path),
            None => None,
        };

        if self.exists_with_name(owner, parent_id, &sanitized) {
            return Err(ServerError::Conflict(format!("directory '{sanitized}' already exists")));
        }

        let physical_path = match &parent_path {
            Some(p) => p.join(&sanitized),
            None => self.storage_root.join(owner).join(&sanitized),
        };

        self.storage.create_directory(&physical_path)?;

        let id = {
            let mut next_id = self.next_id.write().expect("directory catalog lock poisoned");
            *next_id += 1;
            format!("d{next_id}")
        };

        let record = DirectoryRecord {
            id: id.clone(),
            owner: owner.to_string(),
            name: sanitized,
            parent_id: parent_id.map(str::to_string),
            physical_path,
            created_at: now_nanos,
            updated_at: now_nanos,
        };

        {
            let mut records = self.records.write().expect("directory catalog lock poisoned");
            records.insert(id, record.clone());
        }

        if let Err(err) = self.persist() {
            let mut records = self.records.write().expect("directory catalog lock poisoned");
            records.remove(&record.id);
            let _ = self.storage.delete_directory(&record.physical_path, true);
            return Err(err);
        }

        Ok(record)
    }

    /// Renames a directory, rewriting the stored absolute path of every
    /// descendant directory and contained file so that stored paths always
    /// point at the physical location (see the rename-path-propagation
    /// design decision).
    ///
    /// # Errors
    ///
    /// - [`ServerError::NotFound`] if `id` does not resolve for `owner`.
    /// - [`ServerError::Conflict`] if a sibling with the new name exists.
    /// - [`ServerError::Storage`] if the physical rename fails; metadata is
    ///   left untouched in that case.
    #[allow(clippy::expect_used)]
    pub fn rename(
        &self,
        id: &str,
        new_name: &str,
        owner: &str,
        files: &FileCatalog<S>,
        now_nanos: i64,
    ) -> Result<DirectoryRecord, ServerError> {
        let target = self.get(id, owner)?;
        let sanitized = sanitize_name(new_name);

        if sanitized.to_lowercase() != target.name.to_lowercase()
            && self.exists_with_name(owner, target.parent_id.as_deref(), &sanitized)
        {
            return Err(ServerError::Conflict(format!("directory '{sanitized}' already exists")));
        }

        let new_path = target
            .physical_path
            .parent()
            .map_or_else(|| PathBuf::from(&sanitized), |parent| parent.join(&sanitized));

        self.storage.rename_directory(&target.physical_path, &new_path)?;

        let descendants = self.descendant_ids(id, owner);

        let mut records = self.records.write().expect("directory catalog lock poisoned");
        let mut updated = target.clone();
        updated.name = sanitized;
        updated.physical_path = new_path.clone();
        updated.updated_at = now_nanos;
        records.insert(id.to_string(), updated.clone());

        for descendant_id in &descendants {
            if let Some(record) = records.get_mut(descendant_id) {
                if let Ok(suffix) = record.physical_path.strip_prefix(&target.physical_path) {
                    record.physical_path = new_path.join(suffix);
                    record.updated_at = now_nanos;
                }
            }
        }
        drop(records);

        files.rewrite_paths_under(&target.physical_path, &new_path, now_nanos);

        self.persist()?;
        Ok(updated)
    }

    /// Ids of every directory transitively descended from `id`, found by
    /// iterative breadth-first traversal over the catalog index rather than
    /// by following parent pointers from children.
    #[allow(clippy::expect_used)]
    fn descendant_ids(&self, id: &str, owner: &str) -> Vec<String> {
        let records = self.records.read().expect("directory catalog lock poisoned");
        let mut frontier = vec![id.to_string()];
        let mut descendants = Vec::new();

        while let Some(current) = frontier.pop() {
            for record in records.values() {
                if record.owner == owner && record.parent_id.as_deref() == Some(current.as_str()) {
                    descendants.push(record.id.clone());
                    frontier.push(record.id.clone());
                }
            }
        }
        descendants
    }

    /// Lists the immediate children (subdirectories and files) of `id`, or
    /// of the root if `id` is `None`.
    #[allow(clippy::expect_used)]
    pub fn list_children(
        &self,
        id: Option<&str>,
        owner: &str,
        files: &FileCatalog<S>,
    ) -> (Vec<DirectoryRecord>, Vec<FileRecordView>) {
        let records = self.records.read().expect("directory catalog lock poisoned");
        let mut directories: Vec<DirectoryRecord> = records
            .values()
            .filter(|r| r.owner == owner && r.parent_id.as_deref() == id)
            .cloned()
            .collect();
        directories.sort_by(|a, b| a.name.cmp(&b.name));

        let file_records = files.list_in_directory(id, owner);
        (directories, file_records)
    }

    /// Deletes a directory. Non-recursive deletes fail if any child file or
    /// subdirectory exists; recursive deletes walk the subtree bottom-up.
    ///
    /// # Errors
    ///
    /// - [`ServerError::NotFound`] if `id` does not resolve for `owner`.
    /// - [`ServerError::Conflict`] if non-recursive and the directory is not
    ///   empty.
    #[allow(clippy::expect_used)]
    pub fn delete(
        &self,
        id: &str,
        owner: &str,
        recursive: bool,
        files: &FileCatalog<S>,
    ) -> Result<(), ServerError> {
        let target = self.get(id, owner)?;
        let descendants = self.descendant_ids(id, owner);

        if !recursive {
            let has_subdirectories = !descendants.is_empty();
            let has_files = !files.list_in_directory(Some(id), owner).is_empty();
            if has_subdirectories || has_files {
                return Err(ServerError::Conflict(format!("directory {id} is not empty")));
            }
        }

        // Bottom-up: deepest descendants first, then the target itself.
        let mut ordered = descendants;
        ordered.push(id.to_string());

        for directory_id in ordered.iter().rev() {
            files.delete_all_in_directory(directory_id, owner);
        }

        self.storage.delete_directory(&target.physical_path, true)?;

        let mut records = self.records.write().expect("directory catalog lock poisoned");
        for directory_id in &ordered {
            records.remove(directory_id);
        }
        drop(records);

        self.persist()
    }
}

pub use crate::catalog::file::FileRecordView;

#[cfg(test)]
mod tests {
    use crate::storage::MemoryStorage;

    use super::*;

    fn catalogs() -> (DirectoryCatalog<MemoryStorage>, FileCatalog<MemoryStorage>) {
        let storage = MemoryStorage::new();
        let dir_path = PathBuf::from("/meta/directories.json");
        let file_path = PathBuf::from("/meta/files.json");
        (
            DirectoryCatalog::new(storage.clone(), PathBuf::from("/root/storage"), dir_path),
            FileCatalog::new(storage, file_path),
        )
    }

    #[test]
    fn create_rejects_duplicate_sibling_name() {
        let (dirs, _files) = catalogs();
        dirs.create("alice", "docs", None, 0).unwrap();
        let err = dirs.create("alice", "Docs", None, 1).unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
    }

    #[test]
    fn create_under_parent_requires_ownership() {
        let (dirs, _files) = catalogs();
        let root = dirs.create("alice", "docs", None, 0).unwrap();
        assert!(dirs.get(&root.id, "mallory").is_err());
        let err = dirs.create("mallory", "sub", Some(&root.id), 1).unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[test]
    fn rename_rewrites_descendant_paths() {
        let (dirs, files) = catalogs();
        let d1 = dirs.create("alice", "docs", None, 0).unwrap();
        let d2 = dirs.create("alice", "nested", Some(&d1.id), 1).unwrap();

        let renamed = dirs.rename(&d1.id, "papers", "alice", &files, 2).unwrap();
        assert_eq!(renamed.physical_path, PathBuf::from("/root/storage/alice/papers"));

        let nested = dirs.get(&d2.id, "alice").unwrap();
        assert_eq!(nested.physical_path, PathBuf::from("/root/storage/alice/papers/nested"));
    }

    #[test]
    fn delete_non_recursive_fails_when_not_empty() {
        let (dirs, files) = catalogs();
        let d1 = dirs.create("alice", "docs", None, 0).unwrap();
        dirs.create("alice", "nested", Some(&d1.id), 1).unwrap();

        let err = dirs.delete(&d1.id, "alice", false, &files).unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
        assert!(dirs.get(&d1.id, "alice").is_ok());
    }

    #[test]
    fn delete_recursive_removes_subtree() {
        let (dirs, files) = catalogs();
        let d1 = dirs.create("alice", "docs", None, 0).unwrap();
        let d2 = dirs.create("alice", "nested", Some(&d1.id), 1).unwrap();

        dirs.delete(&d1.id, "alice", true, &files).unwrap();
        assert!(dirs.get(&d1.id, "alice").is_err());
        assert!(dirs.get(&d2.id, "alice").is_err());
    }
}
