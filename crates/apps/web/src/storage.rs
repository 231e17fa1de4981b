use feed::cache::KeyValueStore;
use feed::{CacheError, InMemoryStore};

/// `localStorage` when the browser grants it, otherwise a session-only map.
#[derive(Debug)]
pub enum BrowserStore {
    #[cfg(target_arch = "wasm32")]
    Local(feed::cache::LocalStorageStore),
    Memory(InMemoryStore),
}

impl BrowserStore {
    pub fn open() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            match feed::cache::LocalStorageStore::new() {
                Ok(store) => return BrowserStore::Local(store),
                Err(err) => web_sys::console::warn_1(&wasm_bindgen::JsValue::from_str(&format!(
                    "article cache falls back to memory: {err}"
                ))),
            }
        }
        BrowserStore::Memory(InMemoryStore::new())
    }

    pub fn is_persistent(&self) -> bool {
        !matches!(self, BrowserStore::Memory(_))
    }
}

impl KeyValueStore for BrowserStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            #[cfg(target_arch = "wasm32")]
            BrowserStore::Local(s) => s.get_item(key),
            BrowserStore::Memory(s) => s.get_item(key),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        match self {
            #[cfg(target_arch = "wasm32")]
            BrowserStore::Local(s) => s.set_item(key, value),
            BrowserStore::Memory(s) => s.set_item(key, value),
        }
    }

    fn remove_item(&mut self, key: &str) -> Result<(), CacheError> {
        match self {
            #[cfg(target_arch = "wasm32")]
            BrowserStore::Local(s) => s.remove_item(key),
            BrowserStore::Memory(s) => s.remove_item(key),
        }
    }
}
