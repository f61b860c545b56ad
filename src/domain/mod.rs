pub mod errors;
pub mod value_objects;

// Re-export commonly used types
pub use errors::{KvError, KvResult, ValidationError};
pub use value_objects::*;
