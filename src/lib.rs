pub mod backend;
pub mod config;
pub mod model;
pub mod observable;
pub mod storage;
pub mod store;

pub use backend::{Backend, FileBackend, MemoryBackend};
pub use model::{parse_label, AccountErrors, AccountRecord, ErrorField, Label, RecordType};
pub use observable::{Observable, SubscriptionId};
pub use storage::{StorageAdapter, Stored};
pub use store::{AccountStore, ACCOUNT_DATA_KEY};
