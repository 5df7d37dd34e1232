//! Errors and their classification.
//!
//! Per-item failures (`IngestError`) never escape the processing loop: they are
//! folded into the item's `last_error`. The other enums surface from the
//! public queue API or from collaborators whose failures the core swallows.

use thiserror::Error;

use super::ItemId;

/// ErrorKind classifies why an attempt failed.
///
/// All kinds follow the same retry policy; the kind only shapes the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source unreadable or missing.
    Read,
    /// Timeout, abort or connection failure.
    Transport,
    /// The pipeline ran but declined the file.
    Rejected,
}

/// Failure of one processing attempt (read + submit).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("cannot read {source_ref}: {message}")]
    Read { source_ref: String, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected by pipeline: {0}")]
    Rejected(String),
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Read { .. } => ErrorKind::Read,
            IngestError::Transport(_) => ErrorKind::Transport,
            IngestError::Rejected(_) => ErrorKind::Rejected,
        }
    }
}

/// Benign refusals from the user-facing queue operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("item not found: {0}")]
    NotFound(ItemId),

    #[error("item {0} is being processed and cannot be changed")]
    Processing(ItemId),

    #[error("item {0} already completed")]
    AlreadyCompleted(ItemId),

    #[error("item {0} has not failed")]
    NotFailed(ItemId),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The capability does not exist on this host; callers stop trying.
    #[error("notification gateway unavailable")]
    Unavailable,

    #[error("notification delivery failed: {0}")]
    Delivery(String),
}
