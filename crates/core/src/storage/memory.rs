use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::traits::KeyValueStorage;
use crate::errors::CoreError;

/// In-memory key-value storage with an optional byte quota.
///
/// The quota counts key and value bytes of everything stored, the way
/// browsers account local storage. A write that would exceed it fails and
/// leaves the previous value in place.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
    quota: Cell<Option<usize>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        let storage = Self::new();
        storage.quota.set(Some(bytes));
        storage
    }

    /// Change or lift the quota. Existing items are kept even if over it.
    pub fn set_quota(&self, bytes: Option<usize>) {
        self.quota.set(bytes);
    }

    /// Total bytes of keys and values currently stored.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.items
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), CoreError> {
        if let Some(quota) = self.quota.get() {
            let replaced = self
                .items
                .borrow()
                .get(key)
                .map(|old| key.len() + old.len())
                .unwrap_or(0);
            let projected = self.used_bytes() - replaced + key.len() + value.len();
            if projected > quota {
                return Err(CoreError::StorageWrite(format!(
                    "quota exceeded writing '{key}' ({projected} of {quota} bytes)"
                )));
            }
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), CoreError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}
