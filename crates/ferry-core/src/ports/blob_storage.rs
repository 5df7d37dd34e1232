use async_trait::async_trait;

use crate::domain::StorageError;

/// Durable string storage keyed by name.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// `Ok(None)` when nothing was ever stored under `key`.
    async fn get_blob(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_blob(&self, key: &str, value: &str) -> Result<(), StorageError>;
}
