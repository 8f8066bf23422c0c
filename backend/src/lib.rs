//! Upload Backend: issues presigned S3 upload URLs and deletes uploaded objects

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// S3 object storage operations
pub mod media_storage;

/// HTTP routes
pub mod routes;

/// Server bootstrap
pub mod server;

/// Configuration, errors and extractors
pub mod types;

/// In-memory storage and test server for integration tests
#[cfg(feature = "test-utils")]
pub mod testing;
