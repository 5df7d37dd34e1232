//! What goes to the remote pipeline and what comes back.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{IngestError, ItemId, SourceRef};

/// Metadata sent alongside the file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestMetadata {
    pub id: ItemId,
    pub source_ref: SourceRef,
    pub display_name: String,
}

/// Raw reply of the remote ingest call.
///
/// A reply with `success == false` is a remote rejection; transport-level
/// failures never produce a reply at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReply {
    pub success: bool,
    pub result_payload: Option<Value>,
    pub has_notable_content: bool,
    pub error_message: Option<String>,
}

impl IngestReply {
    pub fn ok(result_payload: Option<Value>, has_notable_content: bool) -> Self {
        Self {
            success: true,
            result_payload,
            has_notable_content,
            error_message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Fold the reply into the stored result, or a rejection.
    pub fn into_result(self) -> Result<IngestResult, IngestError> {
        if self.success {
            return Ok(IngestResult {
                payload: self.result_payload,
                has_notable_content: self.has_notable_content,
            });
        }
        let message = self
            .error_message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| "remote pipeline reported failure".to_string());
        Err(IngestError::Rejected(message))
    }
}

/// Opaque success payload kept on a completed item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default)]
    pub has_notable_content: bool,
}
