use async_trait::async_trait;

use crate::domain::{IngestError, IngestMetadata, IngestReply};

/// The remote processing pipeline, seen as a pass/fail call.
///
/// Network-level failures (including the implementation's own timeout) are
/// `Err(IngestError::Transport)`. A pipeline that ran and declined the file
/// answers `Ok` with `success == false`.
#[async_trait]
pub trait RemoteIngest: Send + Sync {
    async fn submit(
        &self,
        content: Vec<u8>,
        metadata: &IngestMetadata,
    ) -> Result<IngestReply, IngestError>;
}
