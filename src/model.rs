pub mod storage;

pub use storage::{parse_label, AccountErrors, AccountRecord, ErrorField, Label, RecordType};
