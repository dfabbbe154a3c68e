//! Filesystem-backed [`Storage`] implementation, the production backend.

use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use super::{Storage, StorageError};

/// Production storage backend writing directly to the local filesystem.
///
/// All reads open in shared-read mode and all writes open in exclusive mode,
/// per the physical storage adapter's contract; there is no in-process state
/// to clone beyond a marker, so cloning is cheap and every clone operates on
/// the same files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl FsStorage {
    /// Creates a new filesystem storage adapter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FsStorage {
    fn create_empty_file(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| StorageError::io(parent, err))?;
        }
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(|_| ())
            .map_err(|err| StorageError::io(path, err))
    }

    fn write_chunk(&self, path: &Path, offset: u64, bytes: &[u8]) -> Result<(), StorageError> {
        let mut file =
            OpenOptions::new().write(true).open(path).map_err(|err| StorageError::io(path, err))?;
        file.seek(SeekFrom::Start(offset)).map_err(|err| StorageError::io(path, err))?;
        file.write_all(bytes).map_err(|err| StorageError::io(path, err))
    }

    fn read_chunk(&self, path: &Path, offset: u64, len: usize) -> Result<Vec<u8>, StorageError> {
        let mut file = File::open(path).map_err(|err| StorageError::io(path, err))?;
        file.seek(SeekFrom::Start(offset)).map_err(|err| StorageError::io(path, err))?;
        let mut buf = vec![0u8; len];
        let mut read_total = 0;
        while read_total < len {
            let n = file.read(&mut buf[read_total..]).map_err(|err| StorageError::io(path, err))?;
            if n == 0 {
                break;
            }
            read_total += n;
        }
        buf.truncate(read_total);
        Ok(buf)
    }

    fn file_size(&self, path: &Path) -> Result<u64, StorageError> {
        fs::metadata(path).map(|m| m.len()).map_err(|err| StorageError::io(path, err))
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|err| StorageError::io(parent, err))?;
        }
        fs::rename(from, to).map_err(|err| StorageError::io(from, err))
    }

    fn delete_file(&self, path: &Path) -> Result<(), StorageError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::io(path, err)),
        }
    }

    fn create_directory(&self, path: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(path).map_err(|err| StorageError::io(path, err))
    }

    fn rename_directory(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|err| StorageError::io(parent, err))?;
        }
        fs::rename(from, to).map_err(|err| StorageError::io(from, err))
    }

    fn delete_directory(&self, path: &Path, recursive: bool) -> Result<(), StorageError> {
        let result =
            if recursive { fs::remove_dir_all(path) } else { fs::remove_dir(path) };
        match result {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::io(path, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn write_then_read_chunk_round_trips() {
        let dir = tempdir().expect("tempdir");
        let storage = FsStorage::new();
        let path = dir.path().join("f1_hello.bin");

        storage.create_empty_file(&path).expect("create");
        storage.write_chunk(&path, 0, b"hello").expect("write");
        storage.write_chunk(&path, 5, b"world").expect("write");

        let bytes = storage.read_chunk(&path, 0, 10).expect("read");
        assert_eq!(&bytes, b"helloworld");
        assert_eq!(storage.file_size(&path).expect("size"), 10);
    }

    #[test]
    fn create_empty_file_rejects_duplicate() {
        let dir = tempdir().expect("tempdir");
        let storage = FsStorage::new();
        let path = dir.path().join("f1_dup.bin");
        storage.create_empty_file(&path).expect("first create");
        assert!(storage.create_empty_file(&path).is_err());
    }

    #[test]
    fn delete_directory_recursive_removes_contents() {
        let dir = tempdir().expect("tempdir");
        let storage = FsStorage::new();
        let sub = dir.path().join("docs");
        storage.create_directory(&sub).expect("create dir");
        storage.create_empty_file(&sub.join("f1_a.bin")).expect("create file");

        assert!(storage.delete_directory(&sub, false).is_err());
        storage.delete_directory(&sub, true).expect("recursive delete");
        assert!(!sub.exists());
    }

    #[test]
    fn delete_file_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        let storage = FsStorage::new();
        let path = dir.path().join("f1_gone.bin");
        storage.delete_file(&path).expect("delete absent file is ok");
    }
}
