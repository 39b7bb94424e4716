use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::rc::Rc;

use crate::errors::CoreError;

use super::traits::{Clock, IdGenerator, KeyValueStorage, StorageKeys};

/// Shared plumbing for the stores: the persistence port, the clock, the id
/// supplier and the collection keys. Cheap to clone; clones share the port.
#[derive(Clone)]
pub struct StorageManager {
    storage: Rc<dyn KeyValueStorage>,
    clock: Rc<dyn Clock>,
    ids: Rc<dyn IdGenerator>,
    keys: StorageKeys,
}

impl std::fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageManager")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl StorageManager {
    pub fn new(
        storage: Rc<dyn KeyValueStorage>,
        clock: Rc<dyn Clock>,
        ids: Rc<dyn IdGenerator>,
        keys: StorageKeys,
    ) -> Self {
        Self {
            storage,
            clock,
            ids,
            keys,
        }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn new_id(&self, prefix: &str) -> String {
        self.ids.generate(prefix)
    }

    pub fn id_generator(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }

    /// Load a JSON array stored under `key`.
    ///
    /// Absent → empty. Unparseable or not an array → empty, and the stored
    /// value is overwritten with `[]` so the next load is clean. Only a
    /// failing storage read is reported to the caller.
    pub fn load_array(&self, key: &str) -> Result<Vec<Value>, CoreError> {
        let Some(raw) = self.storage.get_item(key)? else {
            tracing::debug!(key, "collection absent, starting empty");
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(other) => {
                tracing::warn!(key, kind = json_kind(&other), "collection is not an array, resetting");
                self.reset(key, "[]");
                Ok(Vec::new())
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "corrupted collection, resetting");
                self.reset(key, "[]");
                Ok(Vec::new())
            }
        }
    }

    /// Load a JSON object stored under `key`, with the same recovery rules as
    /// [`load_array`](Self::load_array); a corrupted value is overwritten with
    /// `{}`. `Ok(None)` means "use the default".
    pub fn load_object(&self, key: &str) -> Result<Option<Value>, CoreError> {
        let Some(raw) = self.storage.get_item(key)? else {
            return Ok(None);
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value @ Value::Object(_)) => Ok(Some(value)),
            Ok(other) => {
                tracing::warn!(key, kind = json_kind(&other), "stored value is not an object, resetting");
                self.reset(key, "{}");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "corrupted object, resetting");
                self.reset(key, "{}");
                Ok(None)
            }
        }
    }

    /// Serialize `value` and write it under `key`.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CoreError> {
        let json = serde_json::to_string(value)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize '{key}': {e}")))?;
        self.storage.set_item(key, &json).inspect_err(|e| {
            tracing::warn!(key, error = %e, "write failed");
        })
    }

    fn reset(&self, key: &str, default: &str) {
        if let Err(e) = self.storage.set_item(key, default) {
            tracing::warn!(key, error = %e, "could not overwrite corrupted value");
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
