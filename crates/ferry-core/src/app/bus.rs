//! NotificationBus - throttled observer list.
//!
//! Processing transitions can happen many times per second, so observers are
//! not called per mutation. `schedule_notify` arms one timer per window and
//! every listener runs once when it fires. `flush_notify` skips the wait for
//! transitions that must show up immediately (items added, loop idle).

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tracing::warn;

use super::{Deferred, lock};

type Listener = Arc<dyn Fn() + Send + Sync>;

struct BusInner {
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_id: AtomicU64,
    timer: Deferred,
    deliveries: AtomicU64,
}

impl BusInner {
    fn fire(&self) {
        // Call outside the lock: listeners may subscribe, unsubscribe or read
        // the queue from inside the callback.
        let listeners: Vec<Listener> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        self.deliveries.fetch_add(1, Ordering::Relaxed);
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                warn!("queue listener panicked; ignoring");
            }
        }
    }
}

#[derive(Clone)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

impl NotificationBus {
    pub fn new(window: Duration) -> Self {
        Self {
            inner: Arc::new(BusInner {
                listeners: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
                timer: Deferred::new(window),
                deliveries: AtomicU64::new(0),
            }),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.listeners).push((id, Arc::new(listener)));
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Notify once the current window closes; no-op if already armed.
    pub fn schedule_notify(&self) {
        let bus = Arc::downgrade(&self.inner);
        self.inner.timer.arm(async move {
            if let Some(bus) = bus.upgrade() {
                bus.fire();
            }
        });
    }

    /// Drop any armed timer and notify now.
    pub fn flush_notify(&self) {
        self.inner.timer.cancel();
        self.inner.fire();
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }

    /// How many times listeners have been invoked as a group.
    pub fn deliveries(&self) -> u64 {
        self.inner.deliveries.load(Ordering::Relaxed)
    }
}

/// Disposer returned by [`NotificationBus::subscribe`].
///
/// Dropping it keeps the listener attached; call [`Subscription::unsubscribe`]
/// to detach.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(bus) = self.bus.upgrade() {
            lock(&bus.listeners).retain(|(id, _)| *id != self.id);
        }
    }
}
