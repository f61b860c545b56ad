use std::time::Duration;
use tracing::{debug, warn};

use super::storage_service::translate;
use crate::{
    config::WaiterConfig,
    domain::{KvError, KvResult, value_objects::ObjectKey},
    ports::storage::KvBackend,
};

/// Polls the backend's existence probe until a deleted key is reported absent.
pub struct DeleteWaiter<'a> {
    backend: &'a dyn KvBackend,
    config: WaiterConfig,
}

impl<'a> DeleteWaiter<'a> {
    pub fn new(backend: &'a dyn KvBackend, config: WaiterConfig) -> Self {
        Self { backend, config }
    }

    /// Wait until `key` is absent, returning the number of probes it took.
    ///
    /// Probe failures other than not-found are retried within the same budget. When the
    /// budget runs out the result is [`KvError::DeleteNotConfirmed`] carrying the last probe
    /// error, if the last probe failed.
    pub async fn wait_until_absent(&self, key: &ObjectKey) -> KvResult<u32> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match self.backend.head_object(key).await.map_err(translate) {
                Err(KvError::NotFound) => {
                    debug!(key = %key, attempt, "delete confirmed");
                    return Ok(attempt);
                }
                Ok(()) => last_error = None,
                Err(KvError::Backend(err)) => {
                    debug!(key = %key, attempt, error = %err, "existence probe failed");
                    last_error = Some(err);
                }
                Err(other) => return Err(other),
            }

            if attempt < max_attempts {
                tokio::time::sleep(backoff_delay(&self.config, attempt)).await;
            }
        }

        warn!(key = %key, attempts = max_attempts, "delete not confirmed");
        Err(KvError::DeleteNotConfirmed {
            key: key.to_string(),
            attempts: max_attempts,
            source: last_error,
        })
    }
}

/// Delay to sleep after the given (1-based) attempt
pub(crate) fn backoff_delay(config: &WaiterConfig, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    config.initial_delay.saturating_mul(factor).min(config.max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::storage::{BackendResult, ListPage};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Backend whose probe answers from a fixed script, then repeats the last answer
    struct ScriptedProbe {
        script: Vec<ProbeAnswer>,
        probes: AtomicU32,
    }

    #[derive(Clone, Copy)]
    enum ProbeAnswer {
        Present,
        Absent,
        Failing,
    }

    impl ScriptedProbe {
        fn new(script: Vec<ProbeAnswer>) -> Self {
            Self {
                script,
                probes: AtomicU32::new(0),
            }
        }

        fn probes(&self) -> u32 {
            self.probes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl KvBackend for ScriptedProbe {
        async fn put_object(&self, _key: &ObjectKey, _data: Bytes) -> BackendResult<()> {
            Ok(())
        }

        async fn get_object(&self, _key: &ObjectKey) -> BackendResult<Bytes> {
            Ok(Bytes::new())
        }

        async fn list_page(&self, _prefix: &str, _start: Option<&str>) -> BackendResult<ListPage> {
            Ok(ListPage::default())
        }

        async fn delete_object(&self, _key: &ObjectKey) -> BackendResult<()> {
            Ok(())
        }

        async fn head_object(&self, key: &ObjectKey) -> BackendResult<()> {
            let n = self.probes.fetch_add(1, Ordering::SeqCst) as usize;
            let answer = self.script[n.min(self.script.len() - 1)];
            match answer {
                ProbeAnswer::Present => Ok(()),
                ProbeAnswer::Absent => Err(object_store::Error::NotFound {
                    path: key.to_string(),
                    source: "gone".into(),
                }),
                ProbeAnswer::Failing => Err(object_store::Error::Generic {
                    store: "scripted",
                    source: "503 slow down".into(),
                }),
            }
        }
    }

    fn fast_config(max_attempts: u32) -> WaiterConfig {
        WaiterConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    fn key() -> ObjectKey {
        ObjectKey::new("waiter/key").unwrap()
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = WaiterConfig {
            max_attempts: 10,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };

        assert_eq!(backoff_delay(&config, 1), Duration::from_millis(100));
        assert_eq!(backoff_delay(&config, 2), Duration::from_millis(200));
        assert_eq!(backoff_delay(&config, 3), Duration::from_millis(400));
        assert_eq!(backoff_delay(&config, 4), Duration::from_millis(500));
        assert_eq!(backoff_delay(&config, 40), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_confirms_on_first_probe() {
        let backend = ScriptedProbe::new(vec![ProbeAnswer::Absent]);
        let attempts = DeleteWaiter::new(&backend, fast_config(5))
            .wait_until_absent(&key())
            .await
            .unwrap();

        assert_eq!(attempts, 1);
        assert_eq!(backend.probes(), 1);
    }

    #[tokio::test]
    async fn test_waits_through_consistency_window() {
        let backend = ScriptedProbe::new(vec![
            ProbeAnswer::Present,
            ProbeAnswer::Failing,
            ProbeAnswer::Present,
            ProbeAnswer::Absent,
        ]);
        let attempts = DeleteWaiter::new(&backend, fast_config(5))
            .wait_until_absent(&key())
            .await
            .unwrap();

        assert_eq!(attempts, 4);
    }

    #[tokio::test]
    async fn test_exhaustion_surfaces_not_confirmed() {
        let backend = ScriptedProbe::new(vec![ProbeAnswer::Present]);
        let err = DeleteWaiter::new(&backend, fast_config(3))
            .wait_until_absent(&key())
            .await
            .unwrap_err();

        match err {
            KvError::DeleteNotConfirmed {
                key,
                attempts,
                source,
            } => {
                assert_eq!(key, "waiter/key");
                assert_eq!(attempts, 3);
                assert!(source.is_none());
            }
            other => panic!("expected DeleteNotConfirmed, got {other:?}"),
        }
        assert_eq!(backend.probes(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_keeps_last_probe_error() {
        let backend = ScriptedProbe::new(vec![ProbeAnswer::Present, ProbeAnswer::Failing]);
        let err = DeleteWaiter::new(&backend, fast_config(2))
            .wait_until_absent(&key())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            KvError::DeleteNotConfirmed {
                source: Some(object_store::Error::Generic { .. }),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_zero_budget_still_probes_once() {
        let backend = ScriptedProbe::new(vec![ProbeAnswer::Absent]);
        let attempts = DeleteWaiter::new(&backend, fast_config(0))
            .wait_until_absent(&key())
            .await
            .unwrap();

        assert_eq!(attempts, 1);
    }
}
