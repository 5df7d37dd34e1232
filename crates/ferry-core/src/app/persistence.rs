//! PersistenceManager - debounced snapshot writes and startup restore.
//!
//! Writes stay held until the stored snapshot has been read (or the caller
//! opted out of reading it). A save requested while held is remembered and
//! performed as soon as the load finishes, so the first write always carries
//! the restored items. If storage could not be read at all, writes stay held
//! for the rest of the session and the stored blob is left as it was.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::snapshot::{self, SnapshotError};
use super::{Deferred, lock};
use crate::ports::BlobStorage;
use crate::queue::QueueStore;

/// What `load` found in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing stored yet.
    Empty,
    /// This many items were restored.
    Restored(usize),
    /// The blob did not parse; it was replaced with an empty snapshot.
    DiscardedCorrupt,
    /// The blob used a retired schema; it was replaced with an empty snapshot.
    DiscardedDeprecated,
    /// Storage could not be read; starting empty without touching it.
    Unavailable,
    /// `load_from_storage` already ran for this queue.
    AlreadyLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    /// Storage not read yet.
    Held,
    Open,
    /// Storage was unreadable; never overwrite it.
    Sealed,
}

#[derive(Debug)]
struct WriteGate {
    state: GateState,
    /// A save was requested while held.
    dirty: bool,
}

struct PersistInner {
    storage: Arc<dyn BlobStorage>,
    key: String,
    store: Arc<Mutex<QueueStore>>,
    timer: Deferred,
    // Serializes writes; the snapshot is taken after acquiring it so the last
    // write to land is always the newest state.
    write_lock: tokio::sync::Mutex<()>,
    gate: Mutex<WriteGate>,
    writes: AtomicU64,
}

impl PersistInner {
    async fn write(&self) {
        let _guard = self.write_lock.lock().await;
        {
            let mut gate = lock(&self.gate);
            if gate.state != GateState::Open {
                let held = gate.state == GateState::Held;
                gate.dirty |= held;
                debug!(state = ?gate.state, "queue snapshot write held");
                return;
            }
        }
        let items = lock(&self.store).snapshot();
        let raw = match snapshot::encode(&items) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "failed to encode queue snapshot");
                return;
            }
        };
        match self.storage.set_blob(&self.key, &raw).await {
            Ok(()) => {
                self.writes.fetch_add(1, Ordering::Relaxed);
                debug!(items = items.len(), key = %self.key, "queue snapshot saved");
            }
            Err(e) => warn!(error = %e, key = %self.key, "failed to save queue snapshot"),
        }
    }

    /// Leave the held state. Returns true if a held save must now be written.
    fn open_gate(&self, state: GateState) -> bool {
        let mut gate = lock(&self.gate);
        if gate.state != GateState::Held {
            return false;
        }
        gate.state = state;
        std::mem::take(&mut gate.dirty) && state == GateState::Open
    }
}

#[derive(Clone)]
pub struct PersistenceManager {
    inner: Arc<PersistInner>,
}

impl PersistenceManager {
    pub fn new(
        storage: Arc<dyn BlobStorage>,
        key: impl Into<String>,
        store: Arc<Mutex<QueueStore>>,
        window: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(PersistInner {
                storage,
                key: key.into(),
                store,
                timer: Deferred::new(window),
                write_lock: tokio::sync::Mutex::new(()),
                gate: Mutex::new(WriteGate {
                    state: GateState::Held,
                    dirty: false,
                }),
                writes: AtomicU64::new(0),
            }),
        }
    }

    /// Write once the queue has been quiet for a full window.
    pub fn schedule_save(&self) {
        let inner = Arc::downgrade(&self.inner);
        self.inner.timer.rearm(async move {
            if let Some(inner) = inner.upgrade() {
                inner.write().await;
            }
        });
    }

    /// Cancel any pending write and write now.
    pub async fn flush_save(&self) {
        self.inner.timer.cancel();
        self.inner.write().await;
    }

    /// Like `flush_save`, without waiting for the write to land.
    pub fn flush_save_detached(&self) {
        self.inner.timer.cancel();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.write().await });
    }

    /// Completed snapshot writes, for diagnostics.
    pub fn writes(&self) -> u64 {
        self.inner.writes.load(Ordering::Relaxed)
    }

    /// Allow writes without reading storage first. The next write replaces
    /// whatever is stored.
    pub fn skip_load(&self) {
        if self.inner.open_gate(GateState::Open) {
            self.flush_save_detached();
        }
    }

    /// Restore the stored snapshot into the store, then allow writes.
    ///
    /// Never fails: unreadable, corrupt or retired data yields an empty queue.
    pub async fn load(&self) -> LoadOutcome {
        let outcome = self.read_into_store().await;
        let state = if outcome == LoadOutcome::Unavailable {
            GateState::Sealed
        } else {
            GateState::Open
        };
        if self.inner.open_gate(state) {
            self.flush_save().await;
        }
        outcome
    }

    async fn read_into_store(&self) -> LoadOutcome {
        let raw = match self.inner.storage.get_blob(&self.inner.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return LoadOutcome::Empty,
            Err(e) => {
                warn!(error = %e, key = %self.inner.key, "cannot read queue snapshot; starting empty");
                return LoadOutcome::Unavailable;
            }
        };

        match snapshot::decode(&raw) {
            Ok(items) => {
                let restored = lock(&self.inner.store).restore(items);
                info!(items = restored, "queue snapshot restored");
                LoadOutcome::Restored(restored)
            }
            Err(SnapshotError::Deprecated(field)) => {
                warn!(%field, "discarding queue snapshot written by a retired schema");
                self.discard().await;
                LoadOutcome::DiscardedDeprecated
            }
            Err(e @ SnapshotError::Corrupt(_)) => {
                warn!(error = %e, "discarding corrupt queue snapshot");
                self.discard().await;
                LoadOutcome::DiscardedCorrupt
            }
        }
    }

    async fn discard(&self) {
        if let Err(e) = self.inner.storage.set_blob(&self.inner.key, "[]").await {
            warn!(error = %e, "failed to clear discarded queue snapshot");
        }
    }
}
