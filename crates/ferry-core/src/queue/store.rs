//! In-memory item store.

use std::collections::HashSet;

use super::{ItemStatus, QueueStats, QueuedItem, RetryDecision, RetryPolicy};
use crate::domain::{IngestResult, ItemId, QueueError, SourceRef};

/// Everything the loop needs to run one attempt, copied out of the store so
/// no borrow is held across the read and submit awaits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub id: ItemId,
    pub source_ref: SourceRef,
    pub display_name: String,
    pub retry_count: u32,
}

/// Result of recording a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Back to pending in place.
    Retrying { retry_count: u32 },
    /// Retries exhausted.
    Failed,
}

/// Ordered, append-only collection of queued items.
///
/// Design:
/// - Items keep their insertion slot for life; nothing is ever reordered.
/// - At most one item is `Processing`; `claim_next` refuses to hand out a
///   second one.
/// - A scan cursor remembers the last claimed slot so that a pass visits every
///   pending item once before wrapping back to the front. An item that failed
///   and went back to pending is therefore retried on the next pass, not
///   immediately.
#[derive(Debug, Default)]
pub struct QueueStore {
    items: Vec<QueuedItem>,
    next_seq: u64,
    cursor: Option<u64>,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append new items at the tail. No de-duplication.
    pub fn append(&mut self, items: impl IntoIterator<Item = QueuedItem>) -> Vec<ItemId> {
        let mut ids = Vec::new();
        for mut item in items {
            item.seq = self.next_seq;
            self.next_seq += 1;
            ids.push(item.id);
            self.items.push(item);
        }
        ids
    }

    /// Insert restored items ahead of anything enqueued since startup.
    ///
    /// A `Processing` marker that survived a restart means the outcome of that
    /// attempt is unknown, so such items come back as `Pending`.
    ///
    /// Records whose id is already present are skipped. Returns how many
    /// items were actually inserted.
    pub fn restore(&mut self, restored: Vec<QueuedItem>) -> usize {
        let mut seen: HashSet<ItemId> = self.items.iter().map(|item| item.id).collect();
        let restored: Vec<QueuedItem> = restored
            .into_iter()
            .filter(|item| seen.insert(item.id))
            .collect();
        let count = restored.len();
        let mut merged = Vec::with_capacity(count + self.items.len());
        merged.extend(restored.into_iter().map(|mut item| {
            if item.status == ItemStatus::Processing {
                item.status = ItemStatus::Pending;
            }
            item
        }));
        merged.append(&mut self.items);
        for (seq, item) in merged.iter_mut().enumerate() {
            item.seq = seq as u64;
        }
        self.next_seq = merged.len() as u64;
        self.items = merged;
        self.cursor = None;
        count
    }

    pub fn snapshot(&self) -> Vec<QueuedItem> {
        self.items.clone()
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats::from_items(&self.items)
    }

    pub fn get(&self, id: ItemId) -> Option<&QueuedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        self.items
            .iter()
            .any(|item| item.status == ItemStatus::Pending)
    }

    /// Remove a pending or failed item.
    pub fn cancel(&mut self, id: ItemId) -> Result<QueuedItem, QueueError> {
        let index = self.position(id)?;
        match self.items[index].status {
            ItemStatus::Processing => Err(QueueError::Processing(id)),
            ItemStatus::Completed => Err(QueueError::AlreadyCompleted(id)),
            ItemStatus::Pending | ItemStatus::Failed => Ok(self.items.remove(index)),
        }
    }

    /// Reopen a failed item with a fresh retry budget.
    pub fn retry(&mut self, id: ItemId) -> Result<(), QueueError> {
        let index = self.position(id)?;
        let item = &mut self.items[index];
        if item.status != ItemStatus::Failed {
            return Err(QueueError::NotFailed(id));
        }
        item.reopen();
        Ok(())
    }

    /// Drop every completed or failed item; returns how many went.
    pub fn remove_completed(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !item.status.is_terminal());
        before - self.items.len()
    }

    /// Start the next scan from the front of the queue.
    pub fn rewind(&mut self) {
        self.cursor = None;
    }

    /// Pick the next pending item in scan order and mark it `Processing`.
    pub fn claim_next(&mut self) -> Option<Claim> {
        if self
            .items
            .iter()
            .any(|item| item.status == ItemStatus::Processing)
        {
            return None;
        }

        let after_cursor = self.cursor.and_then(|cursor| {
            self.items
                .iter()
                .position(|item| item.seq > cursor && item.status == ItemStatus::Pending)
        });
        let index = after_cursor.or_else(|| {
            self.items
                .iter()
                .position(|item| item.status == ItemStatus::Pending)
        })?;

        let item = &mut self.items[index];
        item.start_processing();
        self.cursor = Some(item.seq);
        Some(Claim {
            id: item.id,
            source_ref: item.source_ref.clone(),
            display_name: item.display_name.clone(),
            retry_count: item.retry_count,
        })
    }

    /// Record a successful attempt. Returns false if the item is gone or was
    /// not in flight.
    pub fn complete(&mut self, id: ItemId, result: IngestResult) -> bool {
        match self.processing_mut(id) {
            Some(item) => {
                item.mark_completed(result);
                true
            }
            None => false,
        }
    }

    /// Record a failed attempt and apply the retry policy.
    pub fn fail(
        &mut self,
        id: ItemId,
        error: String,
        policy: &RetryPolicy,
    ) -> Option<FailureOutcome> {
        let item = self.processing_mut(id)?;
        match policy.decide(item.retry_count) {
            RetryDecision::Retry { retry_count } => {
                item.schedule_retry(retry_count, error);
                Some(FailureOutcome::Retrying { retry_count })
            }
            RetryDecision::GiveUp => {
                item.mark_failed(error);
                Some(FailureOutcome::Failed)
            }
        }
    }

    fn position(&self, id: ItemId) -> Result<usize, QueueError> {
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or(QueueError::NotFound(id))
    }

    fn processing_mut(&mut self, id: ItemId) -> Option<&mut QueuedItem> {
        self.items
            .iter_mut()
            .find(|item| item.id == id && item.status == ItemStatus::Processing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IngestEntry;
    use chrono::Utc;
    use ulid::Ulid;

    fn item(name: &str) -> QueuedItem {
        QueuedItem::new(
            ItemId::from_ulid(Ulid::new()),
            IngestEntry::new(format!("/files/{name}"), name),
            Utc::now(),
        )
    }

    fn store_with(names: &[&str]) -> (QueueStore, Vec<ItemId>) {
        let mut store = QueueStore::new();
        let ids = store.append(names.iter().map(|n| item(n)));
        (store, ids)
    }

    fn status_of(store: &QueueStore, id: ItemId) -> ItemStatus {
        store.get(id).unwrap().status
    }

    #[test]
    fn append_keeps_order_and_starts_pending() {
        let (store, ids) = store_with(&["a", "b", "c"]);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.iter().map(|i| i.id).collect::<Vec<_>>(), ids);
        assert!(snapshot.iter().all(|i| i.status == ItemStatus::Pending));
        assert!(snapshot.iter().all(|i| i.retry_count == 0));
        assert_eq!(store.stats().pending, 3);
        assert_eq!(store.stats().total, 3);
    }

    #[test]
    fn append_does_not_deduplicate() {
        let mut store = QueueStore::new();
        store.append([item("same")]);
        store.append([item("same")]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn only_one_item_is_claimed_at_a_time() {
        let (mut store, ids) = store_with(&["a", "b"]);
        let claim = store.claim_next().unwrap();
        assert_eq!(claim.id, ids[0]);
        assert!(store.claim_next().is_none());
        assert_eq!(store.stats().processing, 1);
    }

    #[test]
    fn failed_attempt_is_retried_on_next_pass() {
        let (mut store, ids) = store_with(&["a", "b", "c"]);
        let policy = RetryPolicy::default();
        let mut order = Vec::new();

        while let Some(claim) = store.claim_next() {
            order.push(claim.id);
            if claim.id == ids[1] && claim.retry_count == 0 {
                store.fail(claim.id, "boom".into(), &policy);
            } else {
                store.complete(claim.id, IngestResult::default());
            }
        }

        assert_eq!(order, vec![ids[0], ids[1], ids[2], ids[1]]);
        assert_eq!(store.get(ids[1]).unwrap().retry_count, 1);
    }

    #[test]
    fn fourth_failure_marks_failed_with_capped_count() {
        let (mut store, ids) = store_with(&["a"]);
        let policy = RetryPolicy::default();

        let outcomes: Vec<_> = (0..4)
            .map(|_| {
                let claim = store.claim_next().unwrap();
                store.fail(claim.id, "nope".into(), &policy).unwrap()
            })
            .collect();

        assert_eq!(
            outcomes,
            vec![
                FailureOutcome::Retrying { retry_count: 1 },
                FailureOutcome::Retrying { retry_count: 2 },
                FailureOutcome::Retrying { retry_count: 3 },
                FailureOutcome::Failed,
            ]
        );
        let failed = store.get(ids[0]).unwrap();
        assert_eq!(failed.status, ItemStatus::Failed);
        assert_eq!(failed.retry_count, 3);
        assert_eq!(failed.last_error.as_deref(), Some("nope"));
        assert!(store.claim_next().is_none());
    }

    #[test]
    fn success_clears_previous_error() {
        let (mut store, ids) = store_with(&["a"]);
        let claim = store.claim_next().unwrap();
        store.fail(claim.id, "flaky".into(), &RetryPolicy::default());
        let claim = store.claim_next().unwrap();
        assert!(store.complete(claim.id, IngestResult::default()));

        let done = store.get(ids[0]).unwrap();
        assert_eq!(done.status, ItemStatus::Completed);
        assert_eq!(done.retry_count, 1);
        assert!(done.last_error.is_none());
        assert!(done.result.is_some());
    }

    #[test]
    fn cancel_refuses_processing_item() {
        let (mut store, ids) = store_with(&["a", "b"]);
        store.claim_next();
        assert_eq!(store.cancel(ids[0]), Err(QueueError::Processing(ids[0])));
        assert_eq!(status_of(&store, ids[0]), ItemStatus::Processing);

        let removed = store.cancel(ids[1]).unwrap();
        assert_eq!(removed.id, ids[1]);
        assert!(store.get(ids[1]).is_none());
    }

    #[test]
    fn cancel_unknown_item_is_not_found() {
        let (mut store, _) = store_with(&["a"]);
        let stranger = ItemId::from_ulid(Ulid::new());
        assert_eq!(store.cancel(stranger), Err(QueueError::NotFound(stranger)));
    }

    #[test]
    fn cancel_refuses_completed_item() {
        let (mut store, ids) = store_with(&["a"]);
        let claim = store.claim_next().unwrap();
        store.complete(claim.id, IngestResult::default());
        assert_eq!(store.cancel(ids[0]), Err(QueueError::AlreadyCompleted(ids[0])));
    }

    #[test]
    fn retry_reopens_only_failed_items() {
        let (mut store, ids) = store_with(&["a"]);
        let policy = RetryPolicy::new(0);
        assert_eq!(store.retry(ids[0]), Err(QueueError::NotFailed(ids[0])));

        let claim = store.claim_next().unwrap();
        store.fail(claim.id, "nope".into(), &policy);
        store.retry(ids[0]).unwrap();

        let reopened = store.get(ids[0]).unwrap();
        assert_eq!(reopened.status, ItemStatus::Pending);
        assert_eq!(reopened.retry_count, 0);
        assert!(reopened.last_error.is_none());
        assert!(reopened.result.is_none());
    }

    #[test]
    fn remove_completed_spares_pending_and_processing() {
        let (mut store, ids) = store_with(&["done", "dead", "busy", "waiting"]);
        let policy = RetryPolicy::new(0);

        let c = store.claim_next().unwrap();
        store.complete(c.id, IngestResult::default());
        let c = store.claim_next().unwrap();
        store.fail(c.id, "x".into(), &policy);
        store.claim_next().unwrap();

        assert_eq!(store.remove_completed(), 2);
        let left: Vec<_> = store.snapshot().iter().map(|i| i.id).collect();
        assert_eq!(left, vec![ids[2], ids[3]]);
    }

    #[test]
    fn restore_coerces_processing_and_goes_first() {
        let mut store = QueueStore::new();
        let fresh = store.append([item("fresh")]);

        let mut stale = item("stale");
        stale.status = ItemStatus::Processing;
        let stale_id = stale.id;
        assert_eq!(store.restore(vec![stale]), 1);

        let snapshot = store.snapshot();
        assert_eq!(snapshot[0].id, stale_id);
        assert_eq!(snapshot[0].status, ItemStatus::Pending);
        assert_eq!(snapshot[1].id, fresh[0]);
        assert_eq!(store.claim_next().unwrap().id, stale_id);
    }

    #[test]
    fn restore_skips_ids_already_present() {
        let mut store = QueueStore::new();
        let live = item("live");
        let live_id = live.id;
        store.append([live.clone()]);

        let old = item("old");
        let old_id = old.id;
        assert_eq!(store.restore(vec![old.clone(), live, old]), 1);

        let ids: Vec<_> = store.snapshot().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![old_id, live_id]);
    }

    #[test]
    fn rewind_restarts_scan_at_front() {
        let (mut store, ids) = store_with(&["a", "b"]);
        let claim = store.claim_next().unwrap();
        store.fail(claim.id, "x".into(), &RetryPolicy::default());
        store.rewind();
        assert_eq!(store.claim_next().unwrap().id, ids[0]);
    }
}
