//! Queued item: the tracked processing record of one file.

use chrono::{DateTime, Utc};

use super::ItemStatus;
use crate::domain::{IngestEntry, IngestResult, ItemId, SourceRef};

/// One file awaiting or having undergone processing.
///
/// Callers only ever see clones of these (see `QueueStore::snapshot`); the
/// store owns the live records and performs every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedItem {
    pub id: ItemId,
    pub source_ref: SourceRef,
    pub display_name: String,
    pub enqueued_at: DateTime<Utc>,
    pub status: ItemStatus,

    /// Failed attempts that were retried. Never exceeds the policy cap.
    pub retry_count: u32,

    /// Present only after a failed attempt; cleared on success or user retry.
    pub last_error: Option<String>,

    pub result: Option<IngestResult>,

    /// Insertion sequence; defines scan order and never changes.
    pub(crate) seq: u64,
}

impl QueuedItem {
    pub fn new(id: ItemId, entry: IngestEntry, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            id,
            source_ref: entry.source_ref,
            display_name: entry.display_name,
            enqueued_at,
            status: ItemStatus::Pending,
            retry_count: 0,
            last_error: None,
            result: None,
            seq: 0,
        }
    }

    pub(crate) fn start_processing(&mut self) {
        self.status = ItemStatus::Processing;
    }

    pub(crate) fn mark_completed(&mut self, result: IngestResult) {
        self.status = ItemStatus::Completed;
        self.result = Some(result);
        self.last_error = None;
    }

    /// Back to pending in the same slot, one retry spent.
    pub(crate) fn schedule_retry(&mut self, retry_count: u32, error: String) {
        self.status = ItemStatus::Pending;
        self.retry_count = retry_count;
        self.last_error = Some(error);
    }

    pub(crate) fn mark_failed(&mut self, error: String) {
        self.status = ItemStatus::Failed;
        self.last_error = Some(error);
        self.result = None;
    }

    /// User-initiated reopen of a failed item.
    pub(crate) fn reopen(&mut self) {
        self.status = ItemStatus::Pending;
        self.retry_count = 0;
        self.last_error = None;
        self.result = None;
    }
}
