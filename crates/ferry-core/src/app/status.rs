//! Loop diagnostics.

use serde::Serialize;

/// Aggregate counters since the queue was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopDiagnostics {
    /// Processing runs started (idle -> running transitions).
    pub runs: u64,
    /// Read + submit attempts.
    pub attempts: u64,
    pub completed: u64,
    /// Attempts that failed and went back to pending.
    pub retried: u64,
    /// Items that exhausted their retries.
    pub failed: u64,
}
