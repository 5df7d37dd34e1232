//! Deferred - a cancellable one-shot timer on the Tokio clock.
//!
//! `arm` keeps an already armed deadline (throttle: at most one firing per
//! window), `rearm` pushes the deadline out to a full window from now
//! (debounce: fire after a quiet period). `cancel` drops whatever is armed.
//!
//! Each armed timer carries a generation number. A timer task that wakes up
//! after it was cancelled or replaced sees a stale generation and does
//! nothing, so a flush can never be followed by a late duplicate firing.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::lock;

#[derive(Default)]
struct Slot {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

/// Scheduled callback with a fixed window.
///
/// Arming spawns onto the current Tokio runtime and panics outside of one.
pub struct Deferred {
    window: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl Deferred {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Arm the timer unless it is already armed. Returns true if newly armed.
    pub fn arm<F>(&self, fire: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        if slot.handle.is_some() {
            return false;
        }
        self.spawn(&mut slot, fire);
        true
    }

    /// Replace any armed timer with a fresh one a full window from now.
    pub fn rearm<F>(&self, fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        if let Some(handle) = slot.handle.take() {
            handle.abort();
        }
        self.spawn(&mut slot, fire);
    }

    /// Disarm. Returns true if a timer was pending.
    pub fn cancel(&self) -> bool {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        match slot.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.slot).handle.is_some()
    }

    fn spawn<F>(&self, slot: &mut Slot, fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        slot.generation += 1;
        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        let window = self.window;

        slot.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            {
                let mut slot = lock(&shared);
                if slot.generation != generation {
                    return;
                }
                slot.handle = None;
            }
            fire.await;
        }));
    }
}

impl Drop for Deferred {
    fn drop(&mut self) {
        self.cancel();
    }
}
