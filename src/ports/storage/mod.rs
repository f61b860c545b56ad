mod kv_backend;

pub use kv_backend::{BackendResult, KvBackend, ListPage};
