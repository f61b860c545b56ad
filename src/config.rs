use bon::Builder;
use std::time::Duration;

use crate::domain::{KvError, KvResult};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection parameters for the backing bucket.
///
/// Built once and owned by [`crate::Storage`] for its whole lifetime.
#[derive(Clone, Builder)]
pub struct StorageConfig {
    /// Service URL for MinIO and other S3-compatible services. `None` targets AWS.
    #[builder(into)]
    pub endpoint: Option<String>,
    #[builder(into)]
    pub access_key: String,
    #[builder(into)]
    pub secret_key: String,
    #[builder(into, default = DEFAULT_REGION.to_string())]
    pub region: String,
    #[builder(into)]
    pub bucket: String,
    #[builder(default)]
    pub waiter: WaiterConfig,
}

impl StorageConfig {
    /// Read the configuration from `S3_*` environment variables.
    ///
    /// `S3_BUCKET`, `S3_ACCESS_KEY` and `S3_SECRET_KEY` are required. Waiter tuning comes
    /// from `S3KV_DELETE_MAX_ATTEMPTS`, `S3KV_DELETE_DELAY_MS` and `S3KV_DELETE_MAX_DELAY_MS`.
    pub fn from_env() -> KvResult<Self> {
        let defaults = WaiterConfig::default();
        let waiter = WaiterConfig {
            max_attempts: parse_var("S3KV_DELETE_MAX_ATTEMPTS")?.unwrap_or(defaults.max_attempts),
            initial_delay: parse_var("S3KV_DELETE_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_delay),
            max_delay: parse_var("S3KV_DELETE_MAX_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
        };

        Ok(Self {
            endpoint: optional_var("S3_ENDPOINT"),
            access_key: required_var("S3_ACCESS_KEY")?,
            secret_key: required_var("S3_SECRET_KEY")?,
            region: optional_var("S3_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            bucket: required_var("S3_BUCKET")?,
            waiter,
        })
    }

    /// The region to sign requests for, falling back to [`DEFAULT_REGION`] when blank
    pub fn effective_region(&self) -> &str {
        if self.region.trim().is_empty() {
            DEFAULT_REGION
        } else {
            &self.region
        }
    }

    /// Whether the endpoint is plain HTTP (typical for local MinIO)
    pub fn allows_http(&self) -> bool {
        self.endpoint
            .as_deref()
            .is_some_and(|endpoint| endpoint.starts_with("http://"))
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("waiter", &self.waiter)
            .finish()
    }
}

/// Polling policy used to confirm that a deleted key is gone.
///
/// The delay starts at `initial_delay` and doubles after every probe that still sees the
/// key, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaiterConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn required_var(name: &str) -> KvResult<String> {
    optional_var(name).ok_or_else(|| KvError::Configuration {
        message: format!("{} environment variable required", name),
    })
}

fn parse_var<T: std::str::FromStr>(name: &str) -> KvResult<Option<T>> {
    optional_var(name)
        .map(|raw| {
            raw.parse().map_err(|_| KvError::Configuration {
                message: format!("{} has an invalid value: {}", name, raw),
            })
        })
        .transpose()
}
