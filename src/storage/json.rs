use std::{
    fs::{self, File, OpenOptions, rename, write},
    path::{Path, PathBuf},
};

use fs2::FileExt;
use log::debug;
use uuid::Uuid;

use crate::storage::{Storage, StorageError, validate_key};

const LOCK_FILE_NAME: &str = ".lock";

/// Stores each key as `<dir>/<key>.json`.
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn lock(&self) -> Result<File, StorageError> {
        let lock_file_path = self.dir.join(LOCK_FILE_NAME);
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_file_path)
            .map_err(|e| StorageError::LockFailed {
                path: lock_file_path.clone(),
                source: e,
            })?;
        lock_file
            .lock_exclusive()
            .map_err(|e| StorageError::LockFailed {
                path: lock_file_path,
                source: e,
            })?;
        Ok(lock_file)
    }

    fn unlock(&self, lock_file: File) -> Result<(), StorageError> {
        lock_file.unlock().map_err(|e| StorageError::LockFailed {
            path: self.dir.join(LOCK_FILE_NAME),
            source: e,
        })
    }
}

impl Storage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!("read {} bytes for key '{}'", content.len(), key);
                Ok(Some(content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed {
                key: key.to_string(),
                path,
                source: e,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let path = self.key_path(key);

        fs::create_dir_all(&self.dir).map_err(|e| StorageError::WriteFailed {
            key: key.to_string(),
            path: self.dir.clone(),
            source: e,
        })?;

        let temp_path = self.dir.join(format!("{key}.json.tmp.{}", Uuid::new_v4()));
        write(&temp_path, value).map_err(|e| StorageError::WriteFailed {
            key: key.to_string(),
            path: temp_path.clone(),
            source: e,
        })?;

        let lock_file = self.lock()?;

        let renamed = rename(&temp_path, &path).map_err(|e| StorageError::WriteFailed {
            key: key.to_string(),
            path: path.clone(),
            source: e,
        });
        if renamed.is_err() {
            let _ = fs::remove_file(&temp_path);
        }

        self.unlock(lock_file)?;
        renamed?;

        debug!("wrote {} bytes for key '{}'", value.len(), key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let dir_exists = fs::exists(&self.dir).map_err(|e| StorageError::ClearFailed {
            dir: self.dir.clone(),
            source: e,
        })?;
        if !dir_exists {
            return Ok(());
        }

        let lock_file = self.lock()?;

        let file_entries = fs::read_dir(&self.dir)
            .map_err(|e| StorageError::ClearFailed {
                dir: self.dir.clone(),
                source: e,
            })?
            .flatten()
            .filter(|entry| entry.metadata().map(|m| m.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| path.file_name().is_some_and(|name| name != LOCK_FILE_NAME))
            .collect::<Vec<_>>();

        for file_path in &file_entries {
            fs::remove_file(file_path).map_err(|e| StorageError::ClearFailed {
                dir: self.dir.clone(),
                source: e,
            })?;
        }

        self.unlock(lock_file)?;
        debug!("cleared {} entries from {}", file_entries.len(), self.dir.display());
        Ok(())
    }
}
