//! In-memory [`Storage`] implementation used by catalog and engine unit
//! tests so they can exercise storage-dependent logic without touching a
//! real disk.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use super::{Storage, StorageError};

#[derive(Debug, Default)]
struct MemoryStorageInner {
    files: HashMap<PathBuf, Vec<u8>>,
    directories: HashSet<PathBuf>,
}

/// An in-memory stand-in for the filesystem, guarded by a single mutex.
///
/// Mirrors the production [`super::FsStorage`] semantics closely enough for
/// catalog and engine tests (exclusive-create, idempotent delete, recursive
/// directory delete) without any real I/O.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryStorageInner>>,
}

impl MemoryStorage {
    /// Creates a new, empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::expect_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStorageInner> {
        self.inner.lock().expect("in-memory storage mutex poisoned")
    }
}

impl Storage for MemoryStorage {
    fn create_empty_file(&self, path: &Path) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if inner.files.contains_key(path) {
            return Err(StorageError::AlreadyExists(path.display().to_string()));
        }
        if let Some(parent) = path.parent() {
            inner.directories.insert(parent.to_path_buf());
        }
        inner.files.insert(path.to_path_buf(), Vec::new());
        Ok(())
    }

    fn write_chunk(&self, path: &Path, offset: u64, bytes: &[u8]) -> Result<(), StorageError> {
        let mut inner = self.lock();
        let file = inner
            .files
            .get_mut(path)
            .ok_or_else(|| StorageError::NotFound(path.display().to_string()))?;
        let offset = offset as usize;
        if file.len() < offset + bytes.len() {
            file.resize(offset + bytes.len(), 0);
        }
        file[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn read_chunk(&self, path: &Path, offset: u64, len: usize) -> Result<Vec<u8>, StorageError> {
        let inner = self.lock();
        let file = inner
            .files
            .get(path)
            .ok_or_else(|| StorageError::NotFound(path.display().to_string()))?;
        let offset = offset as usize;
        let end = (offset + len).min(file.len());
        if offset >= file.len() {
            return Ok(Vec::new());
        }
        Ok(file[offset..end].to_vec())
    }

    fn file_size(&self, path: &Path) -> Result<u64, StorageError> {
        let inner = self.lock();
        inner
            .files
            .get(path)
            .map(|f| f.len() as u64)
            .ok_or_else(|| StorageError::NotFound(path.display().to_string()))
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        let mut inner = self.lock();
        let bytes = inner
            .files
            .remove(from)
            .ok_or_else(|| StorageError::NotFound(from.display().to_string()))?;
        if let Some(parent) = to.parent() {
            inner.directories.insert(parent.to_path_buf());
        }
        inner.files.insert(to.to_path_buf(), bytes);
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<(), StorageError> {
        self.lock().files.remove(path);
        Ok(())
    }

    fn create_directory(&self, path: &Path) -> Result<(), StorageError> {
        self.lock().directories.insert(path.to_path_buf());
        Ok(())
    }

    fn rename_directory(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        let mut inner = self.lock();
        inner.directories.remove(from);
        inner.directories.insert(to.to_path_buf());

        let affected: Vec<PathBuf> =
            inner.files.keys().filter(|p| p.starts_with(from)).cloned().collect();
        for old_path in affected {
            let Ok(suffix) = old_path.strip_prefix(from) else { continue };
            let new_path = to.join(suffix);
            if let Some(bytes) = inner.files.remove(&old_path) {
                inner.files.insert(new_path, bytes);
            }
        }
        Ok(())
    }

    fn delete_directory(&self, path: &Path, recursive: bool) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if !recursive {
            let has_children = inner.files.keys().any(|p| p.starts_with(path) && p != path)
                || inner.directories.iter().any(|d| d.starts_with(path) && d != path);
            if has_children {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    message: "directory not empty".to_string(),
                });
            }
        }
        inner.directories.retain(|d| !d.starts_with(path));
        inner.files.retain(|f, _| !f.starts_with(path));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_chunk_round_trips() {
        let storage = MemoryStorage::new();
        let path = PathBuf::from("/root/u1/f1_a.bin");
        storage.create_empty_file(&path).unwrap();
        storage.write_chunk(&path, 0, b"abc").unwrap();
        storage.write_chunk(&path, 3, b"def").unwrap();
        assert_eq!(storage.read_chunk(&path, 0, 6).unwrap(), b"abcdef");
    }

    #[test]
    fn rename_directory_moves_contained_files() {
        let storage = MemoryStorage::new();
        let old_dir = PathBuf::from("/root/u1/docs");
        let file = old_dir.join("f1_a.bin");
        storage.create_directory(&old_dir).unwrap();
        storage.create_empty_file(&file).unwrap();
        storage.write_chunk(&file, 0, b"hi").unwrap();

        let new_dir = PathBuf::from("/root/u1/papers");
        storage.rename_directory(&old_dir, &new_dir).unwrap();

        assert_eq!(storage.read_chunk(&new_dir.join("f1_a.bin"), 0, 2).unwrap(), b"hi");
        assert!(storage.read_chunk(&file, 0, 2).is_err());
    }

    #[test]
    fn delete_directory_non_recursive_fails_when_not_empty() {
        let storage = MemoryStorage::new();
        let dir = PathBuf::from("/root/u1/docs");
        storage.create_directory(&dir).unwrap();
        storage.create_empty_file(&dir.join("f1_a.bin")).unwrap();
        assert!(storage.delete_directory(&dir, false).is_err());
        storage.delete_directory(&dir, true).unwrap();
    }
}
