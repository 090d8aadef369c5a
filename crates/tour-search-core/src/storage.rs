//! Persistent, same-origin key/value storage abstraction (§6).
//!
//! The source reads/writes `localStorage` directly; here that capability is
//! a trait so the wasm crate can back it with `web_sys::Storage` while tests
//! use an in-memory fake, and so the engine never depends on a browser being
//! present.

use std::cell::RefCell;
use std::collections::HashMap;

/// The four persistent-storage keys named in §6, as constants so callers
/// never hand-type them.
pub mod keys {
    pub const SAVED_CONFIG: &str = "searchProConfig";
    pub const LIVE_CONFIG: &str = "searchProLiveConfig";
    pub const LAST_APPLIED_CONFIG_HASH: &str = "searchProLastAppliedConfig";
    pub const SHEETS_DATA: &str = "tourGoogleSheetsData";
    pub const SHEETS_DATA_TIMESTAMP: &str = "tourGoogleSheetsData_timestamp";
}

/// A same-origin key/value store. Implementations must be synchronous (the
/// `localStorage` API they abstract is synchronous) and infallible from the
/// engine's point of view: a backing-store failure degrades to treating the
/// key as absent rather than propagating (§7 locality-of-recovery policy).
pub trait PersistentStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory fake used by tests and by any host that has no durable storage.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RefCell<HashMap<String, String>>,
}

impl PersistentStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.inner.borrow_mut().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.inner.borrow_mut().remove(key);
    }
}
