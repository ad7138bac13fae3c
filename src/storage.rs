use std::path::PathBuf;

use thiserror::Error;

pub mod json;
pub mod memory;

/// Key holding the serialized `Settings` object
pub const SETTINGS_KEY: &str = "settings";

/// Key holding the serialized task array
pub const TASKS_KEY: &str = "local_tasks";

/// Key holding the rolling quick backup
pub const QUICK_BACKUP_KEY: &str = "re-start-quick-backup";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read key '{key}' from '{path}': {source}")]
    ReadFailed {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write key '{key}' to '{path}': {source}")]
    WriteFailed {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to clear storage directory '{dir}': {source}")]
    ClearFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to lock storage at '{path}': {source}")]
    LockFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize value for key '{key}': {source}")]
    SerializeFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid storage key '{0}'. Keys may only contain letters, digits, '-' and '_'")]
    InvalidKey(String),
}

/// Synchronous string key-value persistence. No transaction guarantees.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removes every key in the namespace, not only the ones this crate writes.
    fn clear(&self) -> Result<(), StorageError>;
}

pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Serializes `value` as JSON and writes it under `key`.
pub fn set_json<T: serde::Serialize>(
    storage: &impl Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(|e| StorageError::SerializeFailed {
        key: key.to_string(),
        source: e,
    })?;
    storage.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_keys_are_valid() {
        for key in [SETTINGS_KEY, TASKS_KEY, QUICK_BACKUP_KEY] {
            assert!(validate_key(key).is_ok(), "{key} should be a valid key");
        }
    }

    #[test]
    fn test_rejects_path_like_keys() {
        for key in ["", "../settings", "a/b", "a.json", "with space"] {
            assert!(matches!(
                validate_key(key),
                Err(StorageError::InvalidKey(_))
            ));
        }
    }
}
