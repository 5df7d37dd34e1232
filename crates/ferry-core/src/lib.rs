//! ferry-core
//!
//! Durable, ordered, single-flight queue that ships local files to a remote
//! ingest pipeline.
//!
//! # Modules
//! - **domain**: entries, ids, alerts, errors and ingest outcomes
//! - **queue**: the item store, item lifecycle and retry policy
//! - **ports**: seams to the outside world (ByteReader, RemoteIngest, BlobStorage, NotificationGateway, Clock, IdGenerator)
//! - **app**: processing loop, notification bus, persistence and the `IngestQueue` surface
//! - **impls**: concrete adapters (filesystem, HTTP, in-memory and file storage, log alerts)
//! - **config**: TOML configuration

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod queue;

pub use app::{BuildError, IngestQueue, IngestQueueBuilder, LoadOutcome, LoopDiagnostics, Subscription};
pub use config::FerryConfig;
pub use domain::{IngestEntry, ItemId};
pub use queue::{ItemStatus, QueueStats, QueuedItem};
