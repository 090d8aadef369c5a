//! [`LocalStoragePersistentStore`]: backs `PersistentStore` with
//! `window.localStorage`. A missing `window`/`localStorage` (worker context,
//! privacy mode) degrades to every key reading as absent, per the trait's
//! infallibility contract — never a panic, never an error surfaced to the
//! engine.

use tour_search_core::PersistentStore;
use web_sys::Storage;

pub struct LocalStoragePersistentStore {
    storage: Option<Storage>,
}

impl LocalStoragePersistentStore {
    #[must_use]
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok()).flatten();
        Self { storage }
    }
}

impl Default for LocalStoragePersistentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistentStore for LocalStoragePersistentStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref().and_then(|s| s.get_item(key).ok()).flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.set_item(key, value);
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = &self.storage {
            let _ = storage.remove_item(key);
        }
    }
}
