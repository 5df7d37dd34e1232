//! Ports - the seams between the queue core and the outside world.
//!
//! Every collaborator the core consumes is a trait here. Production adapters
//! live in `impls`; tests plug in scripted fakes.
//!
//! - **ByteReader**: resolves a `SourceRef` to bytes
//! - **RemoteIngest**: submits bytes to the processing pipeline
//! - **BlobStorage**: durable key/value strings for the queue snapshot
//! - **NotificationGateway**: optional local alerts
//! - **Clock** / **IdGenerator**: time and identity, swappable for determinism

pub mod blob_storage;
pub mod byte_reader;
pub mod clock;
pub mod id_generator;
pub mod notification_gateway;
pub mod remote_ingest;

pub use self::blob_storage::BlobStorage;
pub use self::byte_reader::ByteReader;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notification_gateway::{NoopGateway, NotificationGateway};
pub use self::remote_ingest::RemoteIngest;
