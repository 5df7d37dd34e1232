use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::app::lock;
use crate::domain::StorageError;
use crate::ports::BlobStorage;

/// Blob storage kept in a `HashMap`; gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryBlobStorage {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        lock(&self.blobs).get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        lock(&self.blobs).insert(key.to_string(), value.to_string());
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn get_blob(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    async fn set_blob(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.insert(key, value);
        Ok(())
    }
}
