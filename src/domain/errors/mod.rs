mod kv_errors;
mod validation_errors;

pub use kv_errors::*;
pub use validation_errors::*;
