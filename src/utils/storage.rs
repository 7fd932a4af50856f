// ============================================================================
// STORAGE - Key/value persistence (localStorage in the browser)
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde::{de::DeserializeOwned, Serialize};
use web_sys::{window, Storage};

/// Text blob storage keyed by fixed names.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), String>;
    fn remove_item(&self, key: &str) -> Result<(), String>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for Rc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        (**self).remove_item(key)
    }
}

pub fn get_local_storage() -> Option<Storage> {
    window()?.local_storage().ok()?
}

/// Browser `window.localStorage`. Shared across tabs, not synchronized live.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

impl KeyValueStorage for LocalStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        let storage = get_local_storage().ok_or("localStorage unavailable")?;
        storage
            .get_item(key)
            .map_err(|_| format!("Error reading '{}' from localStorage", key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        let storage = get_local_storage().ok_or("localStorage unavailable")?;
        storage
            .set_item(key, value)
            .map_err(|_| format!("Error writing '{}' to localStorage", key))
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        let storage = get_local_storage().ok_or("localStorage unavailable")?;
        storage
            .remove_item(key)
            .map_err(|_| format!("Error removing '{}' from localStorage", key))
    }
}

/// In-memory storage. Writes can be switched off to mimic a full quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
    read_only: Cell<bool>,
    failing_keys: RefCell<HashSet<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every write fails like a browser quota error.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    /// Writes to `key` alone fail from now on; other keys still succeed.
    pub fn fail_writes_to(&self, key: &str) {
        self.failing_keys.borrow_mut().insert(key.to_string());
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        if self.read_only.get() || self.failing_keys.borrow().contains(key) {
            return Err(format!("Quota exceeded writing '{}'", key));
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), String> {
        if self.read_only.get() {
            return Err(format!("Quota exceeded removing '{}'", key));
        }
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

pub fn save_json<S, T>(storage: &S, key: &str, value: &T) -> Result<(), String>
where
    S: KeyValueStorage + ?Sized,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string(value)
        .map_err(|e| format!("Error serializing '{}': {}", key, e))?;
    storage.set_item(key, &json)
}

/// Missing keys, unreadable storage and malformed JSON all come back as `None`.
pub fn load_json<S, T>(storage: &S, key: &str) -> Option<T>
where
    S: KeyValueStorage + ?Sized,
    T: DeserializeOwned,
{
    let json = match storage.get_item(key) {
        Ok(Some(json)) => json,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("⚠️ [STORAGE] {}", e);
            return None;
        }
    };

    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("⚠️ [STORAGE] Discarding malformed '{}': {}", key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_json_missing_key_is_none() {
        let storage = MemoryStorage::new();
        assert_eq!(load_json::<_, Vec<u32>>(&storage, "nope"), None);
    }

    #[test]
    fn load_json_malformed_is_none() {
        let storage = MemoryStorage::new();
        storage.set_item("cartItems", "{").unwrap();
        assert_eq!(load_json::<_, Vec<u32>>(&storage, "cartItems"), None);
    }

    #[test]
    fn save_then_load() {
        let storage = MemoryStorage::new();
        save_json(&storage, "numbers", &vec![1u32, 2, 3]).unwrap();
        assert_eq!(load_json::<_, Vec<u32>>(&storage, "numbers"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn read_only_rejects_writes() {
        let storage = MemoryStorage::new();
        storage.set_read_only(true);
        assert!(save_json(&storage, "numbers", &vec![1u32]).is_err());
        assert!(storage.is_empty());
    }
}
