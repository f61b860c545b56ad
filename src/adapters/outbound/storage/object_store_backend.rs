use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, stream};
use object_store::{
    ObjectStore as ObjectStoreClient, PutPayload, UploadPart, memory::InMemory,
    path::Path as ObjectPath,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    domain::value_objects::ObjectKey,
    ports::storage::{BackendResult, KvBackend, ListPage},
};

/// S3's ListObjects page size
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Payloads at or above this size go through a multipart upload
pub const DEFAULT_MULTIPART_THRESHOLD: usize = 8 * 1024 * 1024;

/// Smallest part size S3 accepts for all but the last part
pub const MULTIPART_PART_SIZE: usize = 5 * 1024 * 1024;

/// Parts of one upload in flight at the same time
const MAX_CONCURRENT_PARTS: usize = 8;

/// Adapter that implements [`KvBackend`] on top of any `object_store` client.
///
/// Listing pages are cut client-side from the store's listing stream and resumed with
/// `list_with_offset`, using the last key of a full page as the continuation token. This
/// relies on the store listing in lexicographic key order, which S3 and `InMemory` do.
#[derive(Clone)]
pub struct ObjectStoreBackend {
    inner: Arc<dyn ObjectStoreClient>,
    page_size: usize,
    multipart_threshold: usize,
}

impl ObjectStoreBackend {
    pub fn new(store: Arc<dyn ObjectStoreClient>) -> Self {
        Self {
            inner: store,
            page_size: DEFAULT_PAGE_SIZE,
            multipart_threshold: DEFAULT_MULTIPART_THRESHOLD,
        }
    }

    /// Backend over a fresh in-process store, for tests and local development
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_multipart_threshold(mut self, threshold: usize) -> Self {
        self.multipart_threshold = threshold;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    fn to_object_path(key: &ObjectKey) -> BackendResult<ObjectPath> {
        Ok(ObjectPath::parse(key.as_str())?)
    }

    /// Upload `data` in parts. A started upload that fails is aborted so no orphaned parts
    /// are left behind in the bucket.
    async fn put_multipart(&self, path: &ObjectPath, data: Bytes) -> BackendResult<()> {
        let mut upload = self.inner.put_multipart(path).await?;

        // Part numbers are assigned in call order, so parts are created up front
        let parts: Vec<UploadPart> = (0..data.len())
            .step_by(MULTIPART_PART_SIZE)
            .map(|start| {
                let end = (start + MULTIPART_PART_SIZE).min(data.len());
                upload.put_part(PutPayload::from(data.slice(start..end)))
            })
            .collect();

        let uploaded = stream::iter(parts)
            .buffer_unordered(MAX_CONCURRENT_PARTS)
            .try_collect::<Vec<()>>()
            .await;

        let result = match uploaded {
            Ok(_) => upload.complete().await.map(|_| ()),
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            warn!(path = %path, error = %err, "multipart upload failed, aborting");
            if let Err(abort_err) = upload.abort().await {
                warn!(path = %path, error = %abort_err, "failed to abort multipart upload");
            }
            return Err(err);
        }

        Ok(())
    }
}

/// Directory to hand to the store's listing call for a raw string prefix.
///
/// `object_store` lists by path segment, so `"a/b"` must be listed from `"a"` and narrowed
/// with a string match. Anything that does not parse back verbatim lists from the root.
fn listing_root(prefix: &str) -> Option<ObjectPath> {
    let dir = &prefix[..prefix.rfind('/')?];
    ObjectPath::parse(dir)
        .ok()
        .filter(|path| path.as_ref() == dir && !dir.is_empty())
}

/// Offset that starts a fresh listing just before the first key that can match `prefix`.
///
/// Listing offsets are exclusive, so the prefix minus its last character is used. Returns
/// `None` when that does not parse back verbatim.
fn first_offset(prefix: &str) -> Option<ObjectPath> {
    let mut chars = prefix.chars();
    chars.next_back()?;
    let before = chars.as_str();

    ObjectPath::parse(before)
        .ok()
        .filter(|path| path.as_ref() == before && !before.is_empty())
}

#[async_trait]
impl KvBackend for ObjectStoreBackend {
    async fn put_object(&self, key: &ObjectKey, data: Bytes) -> BackendResult<()> {
        let path = Self::to_object_path(key)?;

        if data.len() >= self.multipart_threshold {
            debug!(key = %key, size = data.len(), "multipart upload");
            return self.put_multipart(&path, data).await;
        }

        self.inner.put(&path, PutPayload::from(data)).await?;
        Ok(())
    }

    async fn get_object(&self, key: &ObjectKey) -> BackendResult<Bytes> {
        let path = Self::to_object_path(key)?;
        let result = self.inner.get(&path).await?;
        result.bytes().await
    }

    async fn list_page(
        &self,
        prefix: &str,
        start_after: Option<&str>,
    ) -> BackendResult<ListPage> {
        let root = listing_root(prefix);
        let offset = match start_after {
            Some(token) => Some(ObjectPath::parse(token)?),
            None => first_offset(prefix),
        };
        let mut stream = match offset {
            Some(offset) => self.inner.list_with_offset(root.as_ref(), &offset),
            None => self.inner.list(root.as_ref()),
        };

        let mut keys = Vec::new();
        while let Some(meta) = stream.try_next().await? {
            let key = meta.location.as_ref();
            if key.starts_with(prefix) {
                keys.push(key.to_string());
                if keys.len() == self.page_size {
                    let next_token = keys.last().cloned();
                    return Ok(ListPage { keys, next_token });
                }
            } else if key > prefix {
                // Matching keys are contiguous in listing order, nothing further can match
                break;
            }
        }

        Ok(ListPage::last(keys))
    }

    async fn delete_object(&self, key: &ObjectKey) -> BackendResult<()> {
        let path = Self::to_object_path(key)?;
        self.inner.delete(&path).await
    }

    async fn head_object(&self, key: &ObjectKey) -> BackendResult<()> {
        let path = Self::to_object_path(key)?;
        self.inner.head(&path).await?;
        Ok(())
    }
}
