mod object_key;

pub use object_key::{MAX_KEY_LENGTH, ObjectKey};
