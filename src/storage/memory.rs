use std::{cell::RefCell, collections::BTreeMap};

use crate::storage::{Storage, StorageError, validate_key};

/// In-process storage. Contents are lost when dropped.
#[derive(Default)]
pub struct MemoryStorage {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.borrow_mut().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_clear() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.set("settings", "{}").unwrap();
        storage.set("other-app", "x").unwrap();
        assert_eq!(storage.get("settings").unwrap().as_deref(), Some("{}"));
        assert_eq!(storage.len(), 2);

        storage.clear().unwrap();
        assert!(storage.is_empty());
        assert!(storage.get("settings").unwrap().is_none());
    }
}
