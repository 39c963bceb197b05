//! Persistent favorites.
//!
//! Favorites live in a durable key-value store under a single namespaced key as
//! a JSON array of ids. The array is read once at startup and rewritten whole on
//! every toggle. Writes are read-modify-write on in-memory state; this is only
//! safe because all callers run on one cooperative thread.

use crate::config::FAVORITES_KEY;
use crate::RecordId;
use log::{debug, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No storage backend is reachable (no window, storage disabled).
    Unavailable(String),
    /// The backend rejected the write (quota, privacy mode).
    WriteFailed(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(detail) => write!(f, "storage unavailable: {}", detail),
            StoreError::WriteFailed(detail) => write!(f, "storage write failed: {}", detail),
        }
    }
}

impl std::error::Error for StoreError {}

/// String key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

fn js_detail(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

/// The browser's `window.localStorage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, StoreError> {
        let window =
            web_sys::window().ok_or_else(|| StoreError::Unavailable("no window".to_string()))?;
        window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(js_detail(e)))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_string()))
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| StoreError::Unavailable(js_detail(e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| StoreError::WriteFailed(js_detail(e)))
    }
}

/// In-memory store. Clones share the same map, which lets a test "reload" from
/// what an earlier instance persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The favorite set, kept in insertion order and mirrored to a store.
pub struct Favorites<S> {
    ids: Vec<RecordId>,
    store: S,
}

impl<S: KeyValueStore> Favorites<S> {
    /// Read the persisted list. Missing, unreadable or malformed data yields an
    /// empty set.
    pub fn load(store: S) -> Self {
        let ids = match store.get(FAVORITES_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<RecordId>>(&raw).unwrap_or_else(|e| {
                warn!("Discarding malformed favorites: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Could not read favorites: {}", e);
                Vec::new()
            }
        };
        let mut deduped: Vec<RecordId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !deduped.contains(&id) {
                deduped.push(id);
            }
        }
        debug!("Loaded {} favorites", deduped.len());
        Self { ids: deduped, store }
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    /// Flip membership of `id` and persist the whole list. Returns whether `id`
    /// is a favorite afterwards. A failed write keeps the in-memory change.
    pub fn toggle(&mut self, id: RecordId) -> bool {
        let now_favorite = match self.ids.iter().position(|&f| f == id) {
            Some(pos) => {
                self.ids.remove(pos);
                false
            }
            None => {
                self.ids.push(id);
                true
            }
        };
        if let Err(e) = self.persist() {
            warn!("Could not persist favorites: {}", e);
        }
        now_favorite
    }

    fn persist(&self) -> Result<(), StoreError> {
        let raw = serde_json::to_string(&self.ids)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        self.store.set(FAVORITES_KEY, &raw)
    }
}
