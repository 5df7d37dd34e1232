use serde_json::{Value, json};

use super::ItemId;

/// A local alert handed to the notification gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    pub data: Value,
}

impl Alert {
    /// The pipeline flagged follow-up content (e.g. upcoming events) in a file.
    pub fn notable(id: ItemId, display_name: &str) -> Self {
        Self {
            title: "New events found".to_string(),
            body: format!("{display_name} mentions something worth following up"),
            data: json!({ "itemId": id.to_string(), "kind": "notable" }),
        }
    }

    /// A file exhausted its retries.
    pub fn failed(id: ItemId, display_name: &str, error: &str) -> Self {
        Self {
            title: "Upload failed".to_string(),
            body: format!("{display_name}: {error}"),
            data: json!({ "itemId": id.to_string(), "kind": "failed" }),
        }
    }
}
