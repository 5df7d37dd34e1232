use async_trait::async_trait;

use crate::domain::{IngestError, SourceRef};
use crate::ports::ByteReader;

/// Treats every `SourceRef` as a local filesystem path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsByteReader;

impl FsByteReader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ByteReader for FsByteReader {
    async fn read(&self, source: &SourceRef) -> Result<Vec<u8>, IngestError> {
        tokio::fs::read(source.as_str())
            .await
            .map_err(|e| IngestError::Read {
                source_ref: source.to_string(),
                message: e.to_string(),
            })
    }
}
