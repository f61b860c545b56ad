//! Key-value storage over an S3-compatible bucket.
//!
//! [`Storage`] stores, fetches, lists and deletes byte values by string key, with a JSON
//! convenience pair on top. The object-storage client is an injected [`KvBackend`], so tests
//! and local tools can run against an in-process store.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - keys and errors
pub use domain::{KvError, KvResult, ObjectKey, ValidationError};

// Port types - interface to the object-storage collaborator
pub use ports::{BackendResult, KvBackend, ListPage};

// Configuration
pub use config::{DEFAULT_REGION, StorageConfig, WaiterConfig};

// The façade
pub use services::Storage;

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{ObjectStoreBackend, create_s3_store};

pub mod prelude {
    pub use crate::{KvBackend, KvError, KvResult, ObjectStoreBackend, Storage, StorageConfig};
}
