use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;
use uuid::Uuid;

use crate::errors::CoreError;

/// Persistence port shaped like browser key-value storage: string keys,
/// string values, synchronous calls.
///
/// Every store writes its whole collection through this trait on each
/// mutation, so an implementation only needs to make single writes durable.
pub trait KeyValueStorage {
    /// Returns `Ok(None)` when the key has never been written.
    fn get_item(&self, key: &str) -> Result<Option<String>, CoreError>;

    /// Replace the value under `key`. Fails with `CoreError::StorageWrite`
    /// when the backend refuses the write (e.g. quota exhausted).
    fn set_item(&self, key: &str, value: &str) -> Result<(), CoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), CoreError>;
}

/// Source of "now" for `createdAt`, `updatedAt` and price history dates.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used by tests and replays.
#[derive(Debug)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { now: Cell::new(at) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Supplier of new record identifiers.
pub trait IdGenerator {
    /// Produce an id never returned before, starting with `prefix` (e.g. "p", "r").
    fn generate(&self, prefix: &str) -> String;
}

/// Random ids: `<prefix>_<uuid v4, simple form>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self, prefix: &str) -> String {
        format!("{prefix}_{}", Uuid::new_v4().simple())
    }
}

/// Deterministic ids: `<prefix>_1`, `<prefix>_2`, ... shared across prefixes.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: Cell<u64>,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self, prefix: &str) -> String {
        let n = self.next.get() + 1;
        self.next.set(n);
        format!("{prefix}_{n}")
    }
}

/// Names of the three stored collections under a common namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    namespace: String,
}

impl StorageKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn purchases(&self) -> String {
        format!("{}_purchases", self.namespace)
    }

    pub fn recipes(&self) -> String {
        format!("{}_recipes", self.namespace)
    }

    pub fn settings(&self) -> String {
        format!("{}_settings", self.namespace)
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::new("pp")
    }
}
