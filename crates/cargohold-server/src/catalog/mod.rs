//! Directory and file metadata catalogs.
//!
//! Each catalog owns an in-memory map guarded by a single write lock and
//! persists a copy-on-write JSON snapshot to one document under the
//! metadata directory, per the crash-recovery design: on startup the
//! snapshot is reloaded, and in-flight uploads whose `complete` flag is
//! false remain visible but are not downloadable.

pub mod directory;
pub mod file;

pub use directory::{DirectoryCatalog, DirectoryRecord};
pub use file::{FileCatalog, FileRecord};

/// Replaces characters that are unsafe in a path component with `_` and
/// caps the result at 100 characters, per the directory/file name
/// sanitization rule.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    sanitized.chars().take(100).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_path_separators() {
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "a".repeat(200);
        assert_eq!(sanitize_name(&long).len(), 100);
    }
}
