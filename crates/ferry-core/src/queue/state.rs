//! Item state machine.

use serde::{Deserialize, Serialize};

/// Item status.
///
/// State transitions:
/// - Pending -> Processing -> Completed
/// - Pending -> Processing -> Pending (failed attempt, retries left)
/// - Pending -> Processing -> Failed (failed attempt, retries exhausted)
/// - Failed -> Pending (explicit user retry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Waiting for the loop to pick it up.
    Pending,

    /// Currently being read or submitted. At most one item at a time.
    Processing,

    /// Accepted by the remote pipeline.
    Completed,

    /// Retries exhausted; needs an explicit retry.
    Failed,
}

impl ItemStatus {
    /// Is this a terminal state (no further automatic transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Failed)
    }

    /// May the user remove an item in this state?
    pub fn is_cancelable(self) -> bool {
        matches!(self, ItemStatus::Pending | ItemStatus::Failed)
    }
}
