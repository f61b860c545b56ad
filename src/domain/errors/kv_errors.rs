use super::ValidationError;
use thiserror::Error as ThisError;

/// Errors returned by the key-value façade.
///
/// Only [`KvError::NotFound`] is interpreted locally. Every other failure reported by the
/// backend arrives as [`KvError::Backend`] carrying the `object_store` error unchanged,
/// so callers branch on `NotFound` and treat the rest as opaque backend failures.
#[derive(ThisError, Debug)]
pub enum KvError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid key: {0}")]
    InvalidKey(#[from] ValidationError),

    #[error("Key not found")]
    NotFound,

    #[error("Storage backend error: {0}")]
    Backend(#[source] object_store::Error),

    #[error("Failed to serialize value: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Failed to deserialize value: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// The delete request was accepted but the backend kept reporting the key as present
    /// (or the probe kept failing) for the whole confirmation budget.
    #[error("Delete of '{key}' not confirmed after {attempts} attempts")]
    DeleteNotConfirmed {
        key: String,
        attempts: u32,
        #[source]
        source: Option<object_store::Error>,
    },
}

impl KvError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, KvError::NotFound)
    }
}

/// Result type for façade operations
pub type KvResult<T> = Result<T, KvError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_not_found_is_distinguished() {
        assert!(KvError::NotFound.is_not_found());

        let backend = KvError::Backend(object_store::Error::Generic {
            store: "test",
            source: "connection reset".into(),
        });
        assert!(!backend.is_not_found());
        assert!(backend.source().is_some());
    }

    #[test]
    fn test_delete_not_confirmed_display_and_source() {
        let err = KvError::DeleteNotConfirmed {
            key: "a/b".to_string(),
            attempts: 3,
            source: None,
        };
        assert_eq!(err.to_string(), "Delete of 'a/b' not confirmed after 3 attempts");
        assert!(err.source().is_none());

        let err = KvError::DeleteNotConfirmed {
            key: "a/b".to_string(),
            attempts: 3,
            source: Some(object_store::Error::Generic {
                store: "test",
                source: "throttled".into(),
            }),
        };
        assert!(err.source().is_some());
    }

    #[test]
    fn test_validation_error_converts() {
        let err: KvError = ValidationError::EmptyKey.into();
        assert!(matches!(err, KvError::InvalidKey(ValidationError::EmptyKey)));
        assert_eq!(err.to_string(), "Invalid key: Key cannot be empty");
    }
}
