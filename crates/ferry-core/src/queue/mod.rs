//! Queue module: item state machine, retry policy, and the in-memory store.
//!
//! Everything here is synchronous and free of I/O. The store is the single
//! source of truth for item state; `app` wraps it in a lock and drives it.

mod record;
mod retry;
mod state;
mod stats;
mod store;

pub use record::QueuedItem;
pub use retry::{RetryDecision, RetryPolicy};
pub use state::ItemStatus;
pub use stats::QueueStats;
pub use store::{Claim, FailureOutcome, QueueStore};
