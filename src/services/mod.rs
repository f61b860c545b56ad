pub mod delete_waiter;
pub mod storage_service;

pub use delete_waiter::DeleteWaiter;
pub use storage_service::Storage;
