// Backend client construction
pub mod s3;

// Port implementation
pub mod object_store_backend;

// Re-export key types
pub use object_store_backend::{
    DEFAULT_MULTIPART_THRESHOLD, DEFAULT_PAGE_SIZE, MULTIPART_PART_SIZE, ObjectStoreBackend,
};
pub use s3::create_s3_store;
