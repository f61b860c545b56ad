/// Validation errors for keys handed to the storage façade
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyKey,
    KeyTooLong {
        actual: usize,
        max: usize,
    },
    InvalidKeyCharacter(char),
    KeyStartsWithSlash,
    KeyEndsWithSlash,
    KeyContainsDoubleSlash,
    /// `.` and `..` segments are not addressable in an object-store path
    RelativeSegment(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyKey => write!(f, "Key cannot be empty"),
            ValidationError::KeyTooLong { actual, max } => {
                write!(f, "Key too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidKeyCharacter(c) => {
                write!(f, "Invalid character in key: {:?}", c)
            }
            ValidationError::KeyStartsWithSlash => write!(f, "Key cannot start with '/'"),
            ValidationError::KeyEndsWithSlash => write!(f, "Key cannot end with '/'"),
            ValidationError::KeyContainsDoubleSlash => write!(f, "Key cannot contain '//'"),
            ValidationError::RelativeSegment(segment) => {
                write!(f, "Key cannot contain a '{}' segment", segment)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
