//! Reference store — one JPEG per registered identity, file stem = name.

use crate::capture::{Frame, FrameError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const REFERENCE_EXT: &str = "jpg";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("failed to create store directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to save reference image for {name}: {source}")]
    SaveImage { name: String, source: FrameError },
}

/// Directory of reference images, keyed by identity name.
pub struct ReferenceStore {
    dir: PathBuf,
}

impl ReferenceStore {
    /// Open (creating if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate and trim a candidate identity name.
    ///
    /// Must be called before any camera access so a bad name never costs
    /// a capture.
    pub fn validate_name(name: &str) -> Result<&str, StoreError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(StoreError::EmptyName);
        }
        Ok(trimmed)
    }

    /// Store `frame` as the reference image for `name`.
    ///
    /// Re-registering a name silently replaces the prior image; there is
    /// no delete operation.
    pub fn register(&self, name: &str, frame: &Frame) -> Result<PathBuf, StoreError> {
        let name = Self::validate_name(name)?;
        let path = self.reference_path(name);
        frame.save_jpeg(&path).map_err(|source| StoreError::SaveImage {
            name: name.to_string(),
            source,
        })?;
        tracing::info!(name, path = %path.display(), "reference registered");
        Ok(path)
    }

    /// All registered names, sorted.
    ///
    /// The order is the verification tie-break order, so it must be
    /// deterministic; directory enumeration order is not.
    pub fn identities(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(REFERENCE_EXT) {
                    return None;
                }
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s.to_string())
            })
            .collect();
        names.sort_unstable();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.identities().is_empty()
    }

    /// Path where the reference image for `name` lives (or would live).
    pub fn reference_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{REFERENCE_EXT}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> Frame {
        Frame::new(vec![128u8; 8 * 8], 8, 8)
    }

    #[test]
    fn test_validate_name_trims() {
        assert_eq!(ReferenceStore::validate_name("  Alice ").unwrap(), "Alice");
    }

    #[test]
    fn test_validate_name_rejects_whitespace_only() {
        assert!(matches!(
            ReferenceStore::validate_name("   "),
            Err(StoreError::EmptyName)
        ));
        assert!(matches!(
            ReferenceStore::validate_name(""),
            Err(StoreError::EmptyName)
        ));
    }

    #[test]
    fn test_register_rejects_whitespace_only_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReferenceStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.register("   ", &frame()),
            Err(StoreError::EmptyName)
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_register_creates_reference_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReferenceStore::open(dir.path()).unwrap();
        let path = store.register("Alice", &frame()).unwrap();
        assert!(path.exists());
        assert_eq!(store.identities(), vec!["Alice".to_string()]);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_register_overwrites_silently() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReferenceStore::open(dir.path()).unwrap();
        store.register("Alice", &frame()).unwrap();
        store.register(" Alice ", &frame()).unwrap();
        assert_eq!(store.identities(), vec!["Alice".to_string()]);
    }

    #[test]
    fn test_identities_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReferenceStore::open(dir.path()).unwrap();
        store.register("carol", &frame()).unwrap();
        store.register("alice", &frame()).unwrap();
        store.register("bob", &frame()).unwrap();
        assert_eq!(
            store.identities(),
            vec!["alice".to_string(), "bob".to_string(), "carol".to_string()]
        );
    }

    #[test]
    fn test_non_reference_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReferenceStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hi").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReferenceStore::open(dir.path().join("faces")).unwrap();
        assert!(store.is_empty());
        assert!(store.identities().is_empty());
    }
}
