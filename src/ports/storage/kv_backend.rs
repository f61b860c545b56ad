use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::value_objects::ObjectKey;

/// Errors from the backend keep the `object_store` vocabulary; the façade interprets them
/// in exactly one place.
pub type BackendResult<T> = Result<T, object_store::Error>;

/// Port for the object-storage collaborator.
///
/// Exposes only the primitives the key-value façade needs. Implementations report a missing
/// object as `object_store::Error::NotFound` from `get_object` and `head_object`.
#[async_trait]
pub trait KvBackend: Send + Sync + 'static {
    /// Store the full payload under `key`, replacing any existing value
    async fn put_object(&self, key: &ObjectKey, data: Bytes) -> BackendResult<()>;

    /// Retrieve the full payload for `key`
    async fn get_object(&self, key: &ObjectKey) -> BackendResult<Bytes>;

    /// Fetch one page of keys starting with `prefix`.
    ///
    /// `start_after` is the continuation token returned by the previous page. A page with
    /// `next_token == None` is the last one.
    async fn list_page(&self, prefix: &str, start_after: Option<&str>)
        -> BackendResult<ListPage>;

    /// Request removal of `key`
    async fn delete_object(&self, key: &ObjectKey) -> BackendResult<()>;

    /// Existence probe that transfers no body
    async fn head_object(&self, key: &ObjectKey) -> BackendResult<()>;
}

/// One page of a prefix listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub keys: Vec<String>,
    pub next_token: Option<String>,
}

impl ListPage {
    pub fn last(keys: Vec<String>) -> Self {
        Self {
            keys,
            next_token: None,
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}
