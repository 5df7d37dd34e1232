//! App - wiring of the queue core.
//!
//! # Components
//! - **Deferred**: a cancellable one-shot timer (throttle / debounce building block)
//! - **NotificationBus**: throttled observer list
//! - **PersistenceManager**: debounced snapshot writes and startup restore
//! - **AlertSink**: best-effort wrapper around the notification gateway
//! - **ProcessingLoop**: the single-flight worker
//! - **IngestQueue** / **IngestQueueBuilder**: the public surface

pub mod alerts;
pub mod builder;
pub mod bus;
pub mod ingest_queue;
pub mod persistence;
pub mod snapshot;
pub mod status;
pub mod timer;
pub mod worker_loop;

pub use self::alerts::AlertSink;
pub use self::builder::{BuildError, IngestQueueBuilder};
pub use self::bus::{NotificationBus, Subscription};
pub use self::ingest_queue::IngestQueue;
pub use self::persistence::{LoadOutcome, PersistenceManager};
pub use self::status::LoopDiagnostics;
pub use self::timer::Deferred;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a std mutex, recovering the data if a previous holder panicked.
///
/// None of the guarded structures can be left half-updated by a panic (every
/// mutation is a single assignment or Vec operation), so the data is still
/// consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
