//! Domain model (ids, entries, ingest outcomes, alerts, errors).
//!
//! Nothing in here performs I/O. Collaborators live behind `ports`, the state
//! machine lives in `queue`, and the wiring lives in `app`.

pub mod alert;
pub mod entry;
pub mod errors;
pub mod ids;
pub mod outcome;

pub use alert::Alert;
pub use entry::{IngestEntry, SUPPORTED_EXTENSIONS, SourceRef, is_supported, scan_paths};
pub use errors::{ErrorKind, GatewayError, IngestError, QueueError, StorageError};
pub use ids::ItemId;
pub use outcome::{IngestMetadata, IngestReply, IngestResult};
