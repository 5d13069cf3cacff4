use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::backend::Backend;

/// Outcome of reading a present key.
#[derive(Debug, Clone, PartialEq)]
pub enum Stored<T> {
    /// Stored text was JSON of the requested shape.
    Parsed(T),
    /// Stored text as-is, when it could not be read as the requested shape.
    Raw(String),
}

impl<T> Stored<T> {
    pub fn parsed(self) -> Option<T> {
        match self {
            Stored::Parsed(v) => Some(v),
            Stored::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&str> {
        match self {
            Stored::Parsed(_) => None,
            Stored::Raw(r) => Some(r),
        }
    }
}

/// Reads and writes JSON serialised values through a [`Backend`].
///
/// None of the operations fail: backend and serialisation problems are
/// logged and reported as `None` or `false`.
#[derive(Debug)]
pub struct StorageAdapter<B> {
    backend: B,
}

impl<B: Backend> StorageAdapter<B> {
    pub fn new(backend: B) -> Self {
        StorageAdapter { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.backend.get_item(key) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Unable to read '{}' from storage: {:#}", key, e);
                None
            }
        }
    }

    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<Stored<T>> {
        let raw = self.read_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(v) => Some(Stored::Parsed(v)),
            Err(e) => {
                debug!(
                    "Value under '{}' is not the expected JSON ({}), returning it raw",
                    key, e
                );
                Some(Stored::Raw(raw))
            }
        }
    }

    /// Untyped read: anything that is not JSON comes back as a JSON string.
    pub fn read_value(&self, key: &str) -> Option<Value> {
        let raw = self.read_raw(key)?;
        Some(serde_json::from_str(&raw).unwrap_or(Value::String(raw)))
    }

    pub fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> bool {
        let serialised = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                warn!("Unable to serialise value for '{}': {}", key, e);
                return false;
            }
        };
        match self.backend.set_item(key, &serialised) {
            Ok(()) => true,
            Err(e) => {
                warn!("Unable to write '{}' to storage: {:#}", key, e);
                false
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.backend.remove_item(key)
            .map_err(|e| warn!("Unable to remove '{}' from storage: {:#}", key, e))
            .is_ok()
    }

    pub fn clear(&mut self) -> bool {
        self.backend.clear()
            .map_err(|e| warn!("Unable to clear storage: {:#}", e))
            .is_ok()
    }

    pub fn has(&self, key: &str) -> bool {
        self.backend.contains_key(key).unwrap_or_else(|e| {
            warn!("Unable to check '{}' in storage: {:#}", key, e);
            false
        })
    }
}
