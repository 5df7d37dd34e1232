//! IngestQueue - the public surface of the queue core.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use super::{
    LoadOutcome, LoopDiagnostics, NotificationBus, PersistenceManager, Subscription, lock,
    worker_loop::ProcessingLoop,
};
use crate::domain::{IngestEntry, ItemId, QueueError};
use crate::ports::{Clock, IdGenerator};
use crate::queue::{QueueStats, QueueStore, QueuedItem};

pub(crate) struct Shared {
    pub(crate) store: Arc<Mutex<QueueStore>>,
    pub(crate) bus: NotificationBus,
    pub(crate) persistence: PersistenceManager,
    pub(crate) worker: Arc<ProcessingLoop>,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) loaded: AtomicBool,
}

/// Durable, ordered, single-flight ingest queue.
///
/// Cheap to clone; clones share the same queue. Built with
/// [`IngestQueueBuilder`](super::IngestQueueBuilder).
///
/// Nothing is written to storage until [`IngestQueue::load_from_storage`]
/// has run, or [`IngestQueue::skip_load`] was called to start from scratch.
/// Changes made before that are saved together with the restored items.
///
/// Operations that start background work (`enqueue`, `retry`, and the timers
/// behind every mutation) spawn onto the current Tokio runtime and must be
/// called from within one.
#[derive(Clone)]
pub struct IngestQueue {
    shared: Arc<Shared>,
}

impl IngestQueue {
    pub(crate) fn from_shared(shared: Shared) -> Self {
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Append one pending item per entry and start processing if idle.
    ///
    /// Observers are notified and the snapshot is written right away rather
    /// than on the usual timers.
    pub fn enqueue(&self, entries: impl IntoIterator<Item = IngestEntry>) -> Vec<ItemId> {
        let shared = &self.shared;
        let items: Vec<QueuedItem> = entries
            .into_iter()
            .map(|entry| {
                QueuedItem::new(shared.ids.generate_item_id(), entry, shared.clock.now())
            })
            .collect();
        if items.is_empty() {
            return Vec::new();
        }

        let ids = lock(&shared.store).append(items);
        debug!(count = ids.len(), "items enqueued");

        shared.bus.flush_notify();
        shared.persistence.flush_save_detached();
        shared.worker.trigger();
        ids
    }

    /// Remove a pending or failed item. An item in flight cannot be cancelled.
    pub fn cancel(&self, id: ItemId) -> Result<(), QueueError> {
        lock(&self.shared.store).cancel(id)?;
        debug!(%id, "item cancelled");
        self.changed();
        Ok(())
    }

    /// Reopen a failed item with a fresh retry budget.
    pub fn retry(&self, id: ItemId) -> Result<(), QueueError> {
        lock(&self.shared.store).retry(id)?;
        debug!(%id, "item reopened");
        self.changed();
        self.shared.worker.trigger();
        Ok(())
    }

    /// Drop every completed and failed item. Returns how many were removed.
    pub fn remove_completed(&self) -> usize {
        let removed = lock(&self.shared.store).remove_completed();
        if removed > 0 {
            debug!(removed, "finished items removed");
            self.changed();
        }
        removed
    }

    pub fn snapshot(&self) -> Vec<QueuedItem> {
        lock(&self.shared.store).snapshot()
    }

    pub fn get(&self, id: ItemId) -> Option<QueuedItem> {
        lock(&self.shared.store).get(id).cloned()
    }

    pub fn stats(&self) -> QueueStats {
        lock(&self.shared.store).stats()
    }

    /// Register a change listener. It runs at most once per notify window.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.shared.bus.subscribe(listener)
    }

    /// Restore the stored snapshot and resume pending work.
    ///
    /// Only the first call reads storage; later calls return
    /// `LoadOutcome::AlreadyLoaded`.
    pub async fn load_from_storage(&self) -> LoadOutcome {
        if self.shared.loaded.swap(true, Ordering::SeqCst) {
            return LoadOutcome::AlreadyLoaded;
        }
        let outcome = self.shared.persistence.load().await;
        self.shared.bus.flush_notify();
        if lock(&self.shared.store).has_pending() {
            self.shared.worker.trigger();
        }
        outcome
    }

    /// Start without reading storage; the next save replaces what is stored.
    ///
    /// Returns false if storage was already loaded (or skipped) before.
    pub fn skip_load(&self) -> bool {
        if self.shared.loaded.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.shared.persistence.skip_load();
        true
    }

    /// Process on the caller's task until nothing is pending.
    ///
    /// Returns false if a run was already active elsewhere; use
    /// [`IngestQueue::wait_idle`] to wait for that one instead.
    pub async fn run_until_idle(&self) -> bool {
        self.shared.worker.run_until_idle().await
    }

    /// Start processing in the background if idle.
    pub fn trigger(&self) -> bool {
        self.shared.worker.trigger()
    }

    pub async fn wait_idle(&self) {
        self.shared.worker.wait_idle().await
    }

    pub fn is_running(&self) -> bool {
        self.shared.worker.is_running()
    }

    pub fn diagnostics(&self) -> LoopDiagnostics {
        self.shared.worker.diagnostics()
    }

    /// Notify observers and write the snapshot now.
    pub async fn flush(&self) {
        self.shared.bus.flush_notify();
        self.shared.persistence.flush_save().await;
    }

    fn changed(&self) {
        self.shared.bus.schedule_notify();
        self.shared.persistence.schedule_save();
    }
}
