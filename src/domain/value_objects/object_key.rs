use crate::domain::errors::ValidationError;

/// S3 rejects keys longer than this many bytes
pub const MAX_KEY_LENGTH: usize = 1024;

/// A validated key in the flat key-value namespace.
///
/// Keys are path-like by convention only. The checks below exist so that every accepted key
/// maps onto exactly one object-store path and comes back unchanged from a listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a new ObjectKey with validation
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.is_empty() {
            return Err(ValidationError::EmptyKey);
        }

        if value.len() > MAX_KEY_LENGTH {
            return Err(ValidationError::KeyTooLong {
                actual: value.len(),
                max: MAX_KEY_LENGTH,
            });
        }

        if let Some(c) = value.chars().find(|c| c.is_control()) {
            return Err(ValidationError::InvalidKeyCharacter(c));
        }

        if value.starts_with('/') {
            return Err(ValidationError::KeyStartsWithSlash);
        }

        if value.ends_with('/') {
            return Err(ValidationError::KeyEndsWithSlash);
        }

        if value.contains("//") {
            return Err(ValidationError::KeyContainsDoubleSlash);
        }

        if let Some(segment) = value.split('/').find(|s| *s == "." || *s == "..") {
            return Err(ValidationError::RelativeSegment(segment.to_string()));
        }

        Ok(Self(value))
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this key has the given prefix
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ObjectKey {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
