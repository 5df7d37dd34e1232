//! Snapshot codec for durable queue state.
//!
//! The stored blob is a JSON array of item records. Records carry identity,
//! status and display metadata only; file content is never written. Older
//! builds embedded the content inline, and a blob with any such field is
//! rejected as a whole rather than migrated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{IngestResult, ItemId, SourceRef};
use crate::queue::{ItemStatus, QueuedItem};

/// Field names that only ever held raw file content.
pub const FORBIDDEN_FIELDS: &[&str] = &[
    "content",
    "contentBase64",
    "fileContent",
    "fileContentBase64",
    "file_content_base64",
];

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not valid: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("snapshot uses a retired schema (field `{0}`)")]
    Deprecated(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedItem {
    id: ItemId,
    source_ref: SourceRef,
    display_name: String,
    enqueued_at: DateTime<Utc>,
    status: ItemStatus,
    retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result_payload: Option<IngestResult>,
}

impl From<&QueuedItem> for PersistedItem {
    fn from(item: &QueuedItem) -> Self {
        Self {
            id: item.id,
            source_ref: item.source_ref.clone(),
            display_name: item.display_name.clone(),
            enqueued_at: item.enqueued_at,
            status: item.status,
            retry_count: item.retry_count,
            last_error: item.last_error.clone(),
            result_payload: item.result.clone(),
        }
    }
}

impl From<PersistedItem> for QueuedItem {
    fn from(record: PersistedItem) -> Self {
        QueuedItem {
            id: record.id,
            source_ref: record.source_ref,
            display_name: record.display_name,
            enqueued_at: record.enqueued_at,
            status: record.status,
            retry_count: record.retry_count,
            last_error: record.last_error,
            result: record.result_payload,
            seq: 0,
        }
    }
}

pub fn encode(items: &[QueuedItem]) -> Result<String, serde_json::Error> {
    let records: Vec<PersistedItem> = items.iter().map(PersistedItem::from).collect();
    serde_json::to_string(&records)
}

pub fn decode(raw: &str) -> Result<Vec<QueuedItem>, SnapshotError> {
    let value: Value = serde_json::from_str(raw)?;

    if let Value::Array(records) = &value {
        for record in records {
            if let Some(field) = forbidden_field(record) {
                return Err(SnapshotError::Deprecated(field.to_string()));
            }
        }
    }

    let records: Vec<PersistedItem> = serde_json::from_value(value)?;
    Ok(records.into_iter().map(QueuedItem::from).collect())
}

fn forbidden_field(record: &Value) -> Option<&'static str> {
    let object = record.as_object()?;
    FORBIDDEN_FIELDS
        .iter()
        .copied()
        .find(|field| object.contains_key(*field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IngestEntry;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;
    use ulid::Ulid;

    fn sample() -> Vec<QueuedItem> {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let mut done = QueuedItem::new(
            ItemId::from_ulid(Ulid::new()),
            IngestEntry::new("/docs/a.pdf", "a.pdf"),
            at,
        );
        done.status = ItemStatus::Completed;
        done.retry_count = 2;
        done.result = Some(IngestResult {
            payload: Some(json!({"category": "invoice"})),
            has_notable_content: true,
        });

        let mut broken = QueuedItem::new(
            ItemId::from_ulid(Ulid::new()),
            IngestEntry::new("/docs/b.png", "b.png"),
            at,
        );
        broken.status = ItemStatus::Failed;
        broken.retry_count = 3;
        broken.last_error = Some("transport error: timeout".into());

        vec![done, broken]
    }

    #[test]
    fn encode_then_decode_preserves_items() {
        let items = sample();
        let decoded = decode(&encode(&items).unwrap()).unwrap();
        assert_eq!(decoded, items);
    }

    #[test]
    fn encoded_records_use_documented_layout() {
        let raw = encode(&sample()).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        let first = value[0].as_object().unwrap();
        for key in ["id", "sourceRef", "displayName", "enqueuedAt", "status", "retryCount", "resultPayload"] {
            assert!(first.contains_key(key), "missing {key}");
        }
        assert!(!first.contains_key("lastError"));
        assert_eq!(value[1]["status"], "failed");
        for field in FORBIDDEN_FIELDS {
            assert!(!raw.contains(field), "raw content field {field} leaked");
        }
    }

    #[rstest]
    #[case("not json at all")]
    #[case("{\"items\": 3}")]
    #[case("[{\"id\": 42}]")]
    fn unparsable_blobs_are_corrupt(#[case] raw: &str) {
        assert!(matches!(decode(raw), Err(SnapshotError::Corrupt(_))));
    }

    #[test]
    fn inline_content_marks_retired_schema() {
        let raw = encode(&sample()).unwrap();
        let mut value: Value = serde_json::from_str(&raw).unwrap();
        value[1]["fileContentBase64"] = json!("aGVsbG8=");
        let err = decode(&value.to_string()).unwrap_err();
        assert!(matches!(err, SnapshotError::Deprecated(field) if field == "fileContentBase64"));
    }

    #[test]
    fn empty_array_is_an_empty_queue() {
        assert!(decode("[]").unwrap().is_empty());
    }
}
