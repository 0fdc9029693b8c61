use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::CheckpointError;

/// Name-based byte storage for checkpoint payloads.
///
/// The manager's only contract with storage: write a payload under a name,
/// list the names currently stored, delete by name. Payload contents are
/// opaque.
pub trait CheckpointStore {
    fn write(&self, name: &str, payload: &[u8]) -> io::Result<()>;
    fn entries(&self) -> io::Result<Vec<String>>;
    fn delete(&self, name: &str) -> io::Result<()>;
}

/// Filesystem-backed store rooted at a single directory.
#[derive(Debug)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    /// Create the store directory. The directory must not already exist;
    /// finding one is a fatal construction error, not a silent merge.
    pub fn create(dir: PathBuf) -> Result<Self, CheckpointError> {
        if dir.exists() {
            return Err(CheckpointError::DestinationExists(dir));
        }
        fs::create_dir_all(&dir)?;
        Ok(DirectoryStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl CheckpointStore for DirectoryStore {
    fn write(&self, name: &str, payload: &[u8]) -> io::Result<()> {
        fs::write(self.dir.join(name), payload)
    }

    fn entries(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                continue;
            }
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn delete(&self, name: &str) -> io::Result<()> {
        fs::remove_file(self.dir.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rejects_existing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("checkpoints");
        fs::create_dir(&target).unwrap();

        let err = DirectoryStore::create(target.clone()).unwrap_err();
        assert!(
            matches!(err, CheckpointError::DestinationExists(ref p) if *p == target),
            "expected DestinationExists, got: {err}"
        );
    }

    #[test]
    fn test_create_makes_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("run").join("checkpoints");

        let store = DirectoryStore::create(target.clone()).unwrap();
        assert!(target.is_dir());
        assert_eq!(store.dir(), target);
    }

    #[test]
    fn test_write_list_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::create(dir.path().join("checkpoints")).unwrap();

        store.write("epoch=0-acc=0.5000.mpk", b"weights").unwrap();
        store.write("epoch=1-acc=0.6000.mpk", b"weights").unwrap();

        let mut names = store.entries().unwrap();
        names.sort();
        assert_eq!(
            names,
            vec!["epoch=0-acc=0.5000.mpk", "epoch=1-acc=0.6000.mpk"]
        );

        store.delete("epoch=0-acc=0.5000.mpk").unwrap();
        assert_eq!(store.entries().unwrap(), vec!["epoch=1-acc=0.6000.mpk"]);
    }

    #[test]
    fn test_entries_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::create(dir.path().join("checkpoints")).unwrap();
        fs::create_dir(store.dir().join("nested")).unwrap();
        store.write("epoch=0-acc=0.5000.mpk", b"w").unwrap();

        assert_eq!(store.entries().unwrap(), vec!["epoch=0-acc=0.5000.mpk"]);
    }

    #[test]
    fn test_delete_missing_name_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::create(dir.path().join("checkpoints")).unwrap();
        assert!(store.delete("epoch=9-acc=0.1000.mpk").is_err());
    }
}
