//! Same-day article cache on top of a string key/value store.
//!
//! Two keys are used: the UTC day the list was fetched (`YYYY-MM-DD`) and the
//! JSON-encoded list itself. A list is only served back on the same day.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::article::Article;
use crate::error::CacheError;

pub const DATE_KEY: &str = "flare-articles-date";
pub const DATA_KEY: &str = "flare-articles-data";

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), CacheError>;
    fn remove_item(&mut self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    items: BTreeMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), CacheError> {
        self.items.remove(key);
        Ok(())
    }
}

/// UTC calendar day used as the cache date.
pub fn day_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

pub fn today_key() -> String {
    day_key(Utc::now())
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Cached today and non-empty.
    Fresh(Vec<Article>),
    /// Nothing usable: missing, from another day, empty or unreadable.
    Miss,
}

#[derive(Debug)]
pub struct ArticleCache<S> {
    store: S,
}

impl<S: KeyValueStore> ArticleCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub fn store_ref(&self) -> &S {
        &self.store
    }

    pub fn lookup(&self, today: &str) -> CacheLookup {
        match self.try_lookup(today) {
            Ok(Some(articles)) => CacheLookup::Fresh(articles),
            Ok(None) => CacheLookup::Miss,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable article cache");
                CacheLookup::Miss
            }
        }
    }

    fn try_lookup(&self, today: &str) -> Result<Option<Vec<Article>>, CacheError> {
        let Some(date) = self.store.get_item(DATE_KEY)? else {
            return Ok(None);
        };
        if date != today {
            return Ok(None);
        }
        let Some(raw) = self.store.get_item(DATA_KEY)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        let articles: Vec<Article> =
            serde_json::from_str(&raw).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        Ok((!articles.is_empty()).then_some(articles))
    }

    pub fn save(&mut self, today: &str, articles: &[Article]) -> Result<(), CacheError> {
        let raw = serde_json::to_string(articles).map_err(|e| CacheError::Io(e.to_string()))?;
        self.store.set_item(DATE_KEY, today)?;
        self.store.set_item(DATA_KEY, &raw)?;
        tracing::debug!(count = articles.len(), day = today, "article cache written");
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.store.remove_item(DATE_KEY)?;
        self.store.remove_item(DATA_KEY)
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod file_store {
    use std::path::PathBuf;

    use super::KeyValueStore;
    use crate::error::CacheError;

    /// One file per key under a directory.
    #[derive(Debug, Clone)]
    pub struct FileStore {
        dir: PathBuf,
    }

    impl FileStore {
        pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
            let dir = dir.into();
            std::fs::create_dir_all(&dir)
                .map_err(|e| CacheError::Io(format!("create {}: {e}", dir.display())))?;
            Ok(Self { dir })
        }

        fn path(&self, key: &str) -> PathBuf {
            self.dir.join(format!("{key}.json"))
        }
    }

    impl KeyValueStore for FileStore {
        fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
            match std::fs::read_to_string(self.path(key)) {
                Ok(s) => Ok(Some(s)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(CacheError::Io(e.to_string())),
            }
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
            std::fs::write(self.path(key), value).map_err(|e| CacheError::Io(e.to_string()))
        }

        fn remove_item(&mut self, key: &str) -> Result<(), CacheError> {
            match std::fs::remove_file(self.path(key)) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(CacheError::Io(e.to_string())),
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file_store::FileStore;

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::KeyValueStore;
    use crate::error::CacheError;

    /// `window.localStorage`.
    #[derive(Debug, Default)]
    pub struct LocalStorageStore;

    impl LocalStorageStore {
        pub fn new() -> Result<Self, CacheError> {
            window_local_storage()?;
            Ok(Self)
        }
    }

    impl KeyValueStore for LocalStorageStore {
        fn get_item(&self, key: &str) -> Result<Option<String>, CacheError> {
            window_local_storage()?
                .get_item(key)
                .map_err(|e| CacheError::Io(format!("get_item({key}) failed: {e:?}")))
        }

        fn set_item(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
            window_local_storage()?
                .set_item(key, value)
                .map_err(|e| CacheError::Io(format!("set_item({key}) failed: {e:?}")))
        }

        fn remove_item(&mut self, key: &str) -> Result<(), CacheError> {
            window_local_storage()?
                .remove_item(key)
                .map_err(|e| CacheError::Io(format!("remove_item({key}) failed: {e:?}")))
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, CacheError> {
        let win = web_sys::window().ok_or(CacheError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| CacheError::Io(format!("localStorage error: {e:?}")))?
            .ok_or(CacheError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::LocalStorageStore;
