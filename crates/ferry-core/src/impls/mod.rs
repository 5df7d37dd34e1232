//! Impls - adapters for the ports.
//!
//! - **MemoryBlobStorage**: process-local storage (tests, ephemeral runs)
//! - **FileBlobStorage**: one file per key under a state directory
//! - **FsByteReader**: reads sources as local paths
//! - **HttpIngest**: JSON-over-HTTP client for the ingest endpoint
//! - **TracingGateway**: alerts as log lines

pub mod file_storage;
pub mod fs_reader;
pub mod http_ingest;
pub mod memory_storage;
pub mod tracing_gateway;

pub use self::file_storage::FileBlobStorage;
pub use self::fs_reader::FsByteReader;
pub use self::http_ingest::HttpIngest;
pub use self::memory_storage::MemoryBlobStorage;
pub use self::tracing_gateway::TracingGateway;
