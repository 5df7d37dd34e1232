//! IngestQueueBuilder - construction and wiring.
//!
//! The two collaborators the loop cannot work without (byte reader and remote
//! ingest) are checked at `build()` time. Everything else has a default:
//! in-memory storage, a no-op gateway, the system clock and ULID ids.

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use super::ingest_queue::Shared;
use super::worker_loop::ProcessingLoop;
use super::{AlertSink, IngestQueue, NotificationBus, PersistenceManager};
use crate::config::QueueConfig;
use crate::impls::MemoryBlobStorage;
use crate::ports::{
    BlobStorage, ByteReader, Clock, IdGenerator, NoopGateway, NotificationGateway, RemoteIngest,
    SystemClock, UlidGenerator,
};
use crate::queue::QueueStore;

/// Error raised when the builder is missing a required collaborator.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no byte reader configured")]
    MissingByteReader,

    #[error("no remote ingest configured")]
    MissingRemoteIngest,
}

/// Builds an [`IngestQueue`].
///
/// # Example
/// ```ignore
/// let queue = IngestQueueBuilder::new()
///     .byte_reader(Arc::new(FsByteReader::new()))
///     .remote_ingest(Arc::new(HttpIngest::from_config(&config.remote)?))
///     .storage(Arc::new(FileBlobStorage::new(&config.storage.state_dir)))
///     .config(config.queue.clone())
///     .build()?;
/// queue.load_from_storage().await;
/// ```
#[derive(Default)]
pub struct IngestQueueBuilder {
    reader: Option<Arc<dyn ByteReader>>,
    ingest: Option<Arc<dyn RemoteIngest>>,
    storage: Option<Arc<dyn BlobStorage>>,
    gateway: Option<Arc<dyn NotificationGateway>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    config: QueueConfig,
}

impl IngestQueueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn byte_reader(mut self, reader: Arc<dyn ByteReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn remote_ingest(mut self, ingest: Arc<dyn RemoteIngest>) -> Self {
        self.ingest = Some(ingest);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn BlobStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn gateway(mut self, gateway: Arc<dyn NotificationGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<IngestQueue, BuildError> {
        let reader = self.reader.ok_or(BuildError::MissingByteReader)?;
        let ingest = self.ingest.ok_or(BuildError::MissingRemoteIngest)?;
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryBlobStorage::new()));
        let gateway = self.gateway.unwrap_or_else(|| Arc::new(NoopGateway));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));

        let store = Arc::new(Mutex::new(QueueStore::new()));
        let bus = NotificationBus::new(self.config.notify_window());
        let persistence = PersistenceManager::new(
            storage,
            self.config.storage_key.clone(),
            Arc::clone(&store),
            self.config.save_window(),
        );
        let worker = Arc::new(ProcessingLoop::new(
            Arc::clone(&store),
            reader,
            ingest,
            AlertSink::new(gateway),
            bus.clone(),
            persistence.clone(),
            self.config.retry_policy(),
        ));

        Ok(IngestQueue::from_shared(Shared {
            store,
            bus,
            persistence,
            worker,
            ids,
            clock,
            loaded: AtomicBool::new(false),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IngestError, IngestMetadata, IngestReply, SourceRef};
    use async_trait::async_trait;

    struct NullReader;

    #[async_trait]
    impl ByteReader for NullReader {
        async fn read(&self, _source: &SourceRef) -> Result<Vec<u8>, IngestError> {
            Ok(Vec::new())
        }
    }

    struct NullIngest;

    #[async_trait]
    impl RemoteIngest for NullIngest {
        async fn submit(
            &self,
            _content: Vec<u8>,
            _metadata: &IngestMetadata,
        ) -> Result<IngestReply, IngestError> {
            Ok(IngestReply::ok(None, false))
        }
    }

    #[test]
    fn build_requires_reader() {
        let result = IngestQueueBuilder::new()
            .remote_ingest(Arc::new(NullIngest))
            .build();
        assert!(matches!(result, Err(BuildError::MissingByteReader)));
    }

    #[test]
    fn build_requires_ingest() {
        let result = IngestQueueBuilder::new()
            .byte_reader(Arc::new(NullReader))
            .build();
        assert!(matches!(result, Err(BuildError::MissingRemoteIngest)));
    }

    #[test]
    fn build_with_defaults_starts_empty_and_idle() {
        let queue = IngestQueueBuilder::new()
            .byte_reader(Arc::new(NullReader))
            .remote_ingest(Arc::new(NullIngest))
            .build()
            .unwrap();
        assert_eq!(queue.stats().total, 0);
        assert!(!queue.is_running());
    }
}
