use async_trait::async_trait;

use crate::domain::{IngestError, SourceRef};

/// Resolves a source locator to file content.
///
/// Failures must be reported as `IngestError::Read`; the loop treats them like
/// any other failed attempt.
#[async_trait]
pub trait ByteReader: Send + Sync {
    async fn read(&self, source: &SourceRef) -> Result<Vec<u8>, IngestError>;
}
