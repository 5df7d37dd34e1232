use serde::{Deserialize, Serialize};

use super::{ItemStatus, QueuedItem};

/// Per-status counts over the whole queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
}

impl QueueStats {
    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a QueuedItem>) -> Self {
        let mut stats = QueueStats::default();
        for item in items {
            match item.status {
                ItemStatus::Pending => stats.pending += 1,
                ItemStatus::Processing => stats.processing += 1,
                ItemStatus::Completed => stats.completed += 1,
                ItemStatus::Failed => stats.failed += 1,
            }
            stats.total += 1;
        }
        stats
    }

    /// Nothing left for the loop to do.
    pub fn is_settled(&self) -> bool {
        self.pending == 0 && self.processing == 0
    }
}
