pub mod model;
pub mod schedule;
pub mod storage;
pub mod store;
pub mod urgency;

pub use model::Reminder;
pub use storage::{FileStorage, KeyValueStorage};
#[cfg(test)]
pub use storage::MemoryStorage;
pub use store::{Store, StoreError};
pub use urgency::{classify, Classification, Urgency};
