use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::debug;

use super::delete_waiter::DeleteWaiter;
use crate::{
    adapters::outbound::storage::{ObjectStoreBackend, create_s3_store},
    config::StorageConfig,
    domain::{KvError, KvResult, value_objects::ObjectKey},
    ports::storage::KvBackend,
};

/// Key-value storage over an object-storage bucket.
///
/// Cloning is cheap and clones share the same backend client, so one `Storage` can be
/// handed to any number of concurrent tasks.
#[derive(Clone)]
pub struct Storage {
    config: Arc<StorageConfig>,
    backend: Arc<dyn KvBackend>,
}

/// Interpret a backend failure.
///
/// This is the only place backend errors are inspected: an absent object becomes
/// [`KvError::NotFound`] and everything else is passed through untouched.
pub(crate) fn translate(err: object_store::Error) -> KvError {
    match err {
        object_store::Error::NotFound { .. } => KvError::NotFound,
        other => KvError::Backend(other),
    }
}

impl Storage {
    /// Build a storage handle for the configured S3-compatible bucket.
    ///
    /// No request is made to the service; unreachable endpoints and bad credentials surface
    /// on the first operation.
    pub fn new(config: StorageConfig) -> KvResult<Self> {
        let store = create_s3_store(&config)?;
        debug!(
            bucket = %config.bucket,
            region = config.effective_region(),
            "storage client created"
        );
        Ok(Self::with_backend(config, Arc::new(ObjectStoreBackend::new(store))))
    }

    /// Build a storage handle over an explicit backend
    pub fn with_backend(config: StorageConfig, backend: Arc<dyn KvBackend>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
        }
    }

    /// Storage over a fresh in-process store
    pub fn in_memory() -> Self {
        let config = StorageConfig::builder()
            .bucket("in-memory")
            .access_key("")
            .secret_key("")
            .build();
        Self::with_backend(config, Arc::new(ObjectStoreBackend::in_memory()))
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Store `value` under `key`, replacing any existing value.
    ///
    /// Keys must map onto a single object-store path: keys that are empty, start or end
    /// with `/`, contain `//`, have `.` or `..` segments or control characters are rejected
    /// with [`KvError::InvalidKey`] even though S3 itself would accept some of them.
    pub async fn put(&self, key: &str, value: impl Into<Bytes>) -> KvResult<()> {
        let key = ObjectKey::new(key)?;
        let value = value.into();
        debug!(key = %key, size = value.len(), "put");

        self.backend.put_object(&key, value).await.map_err(translate)
    }

    /// Serialize `value` as JSON and store it under `key`
    pub async fn put_object<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> KvResult<()> {
        let buf = serde_json::to_vec(value).map_err(KvError::Serialization)?;
        self.put(key, buf).await
    }

    /// Fetch the value stored under `key`.
    ///
    /// Returns [`KvError::NotFound`] if the key does not exist, and
    /// [`KvError::InvalidKey`] for keys [`Storage::put`] would reject.
    pub async fn get(&self, key: &str) -> KvResult<Bytes> {
        let key = ObjectKey::new(key)?;
        let value = self.backend.get_object(&key).await.map_err(translate)?;
        debug!(key = %key, size = value.len(), "get");
        Ok(value)
    }

    /// Fetch a JSON-encoded value and deserialize it
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> KvResult<T> {
        let buf = self.get(key).await?;
        serde_json::from_slice(&buf).map_err(KvError::Deserialization)
    }

    /// List every key that starts with `prefix`, following continuation tokens until the
    /// backend reports the last page.
    ///
    /// Keys come back in backend order. A key written by another client that is not a valid
    /// object-store path (see [`Storage::put`]) fails the listing with [`KvError::Backend`].
    pub async fn list(&self, prefix: &str) -> KvResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .backend
                .list_page(prefix, token.as_deref())
                .await
                .map_err(translate)?;
            pages += 1;
            keys.extend(page.keys);

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        debug!(prefix, pages, count = keys.len(), "list");
        Ok(keys)
    }

    /// Delete `key` and wait until the backend confirms it is gone.
    ///
    /// Deleting a key that does not exist succeeds. If absence cannot be confirmed within
    /// the waiter budget the result is [`KvError::DeleteNotConfirmed`]; the delete request
    /// itself was accepted in that case.
    pub async fn delete(&self, key: &str) -> KvResult<()> {
        let key = ObjectKey::new(key)?;

        match self.backend.delete_object(&key).await.map_err(translate) {
            Ok(()) | Err(KvError::NotFound) => {}
            Err(err) => return Err(err),
        }

        let attempts = DeleteWaiter::new(self.backend.as_ref(), self.config.waiter)
            .wait_until_absent(&key)
            .await?;
        debug!(key = %key, attempts, "delete");
        Ok(())
    }

    /// Check whether `key` exists without downloading its value
    pub async fn key_exists(&self, key: &str) -> KvResult<bool> {
        let key = ObjectKey::new(key)?;

        match self.backend.head_object(&key).await.map_err(translate) {
            Ok(()) => Ok(true),
            Err(KvError::NotFound) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
