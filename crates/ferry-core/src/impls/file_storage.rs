//! FileBlobStorage - one JSON file per key.
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! crash mid-write leaves the previous snapshot intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::StorageError;
use crate::ports::BlobStorage;

#[derive(Debug, Clone)]
pub struct FileBlobStorage {
    dir: PathBuf,
}

impl FileBlobStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path backing `key`. Characters outside `[A-Za-z0-9._-]` become `_`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

#[async_trait]
impl BlobStorage for FileBlobStorage {
    async fn get_blob(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_blob(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileBlobStorage::new(dir.path());
        assert!(storage.get_blob("ferry.queue").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_then_get_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileBlobStorage::new(dir.path().join("nested"));

        storage.set_blob("ferry.queue", "[1]").await.unwrap();
        storage.set_blob("ferry.queue", "[2]").await.unwrap();

        assert_eq!(
            storage.get_blob("ferry.queue").await.unwrap().as_deref(),
            Some("[2]")
        );
        assert!(!storage.path_for("ferry.queue").with_extension("json.tmp").exists());
    }

    #[test]
    fn keys_are_sanitized() {
        let storage = FileBlobStorage::new("/state");
        assert_eq!(
            storage.path_for("../queue/main"),
            PathBuf::from("/state/.._queue_main.json")
        );
    }
}
