//! S3 client construction using the object_store crate

use object_store::{ObjectStore as ObjectStoreClient, aws::AmazonS3Builder};
use std::sync::Arc;

use crate::{
    config::StorageConfig,
    domain::{KvError, KvResult},
};

/// Create an S3 store from configuration.
///
/// Only builds the local client; no request is sent to the service.
pub fn create_s3_store(config: &StorageConfig) -> KvResult<Arc<dyn ObjectStoreClient>> {
    if config.bucket.trim().is_empty() {
        return Err(KvError::Configuration {
            message: "bucket name is required".to_string(),
        });
    }

    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(&config.bucket)
        .with_region(config.effective_region())
        .with_access_key_id(&config.access_key)
        .with_secret_access_key(&config.secret_key);

    if let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.is_empty()) {
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(config.allows_http());
    }

    let store = builder.build().map_err(|e| KvError::Configuration {
        message: format!("Failed to build S3 client: {}", e),
    })?;

    Ok(Arc::new(store))
}
