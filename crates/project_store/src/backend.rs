use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::ProjectStoreError;
use crate::paths::key_file_name;

/// Key-value storage holding whole serialized values per key.
pub trait StorageBackend: Send {
    /// Returns the stored value, or `None` when the key was never written.
    fn read(&self, key: &str) -> Result<Option<String>, ProjectStoreError>;

    /// Replaces the stored value for `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), ProjectStoreError>;
}

/// One JSON file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key_file_name(key))
    }
}

impl StorageBackend for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, ProjectStoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ProjectStoreError::io("reading storage file", path, source)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ProjectStoreError> {
        fs::create_dir_all(&self.root).map_err(|source| {
            ProjectStoreError::io("creating storage directory", &self.root, source)
        })?;

        let final_path = self.path_for(key);
        let tmp_path = self.root.join(format!("{}.tmp", key_file_name(key)));
        fs::write(&tmp_path, value)
            .map_err(|source| ProjectStoreError::io("writing storage file", &tmp_path, source))?;

        match fs::rename(&tmp_path, &final_path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                if !final_path.exists() {
                    return Err(ProjectStoreError::io(
                        "replacing storage file",
                        &final_path,
                        rename_err,
                    ));
                }

                fs::remove_file(&final_path).map_err(|source| {
                    ProjectStoreError::io("removing stale storage file", &final_path, source)
                })?;
                fs::rename(&tmp_path, &final_path).map_err(|source| {
                    ProjectStoreError::io("replacing storage file", &final_path, source)
                })
            }
        }
    }
}

/// In-process storage. Clones share the same map, so a second store opened over
/// a clone observes what the first one wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw value without going through a `ProjectStore`.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        lock_unpoisoned(&self.values).insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<String> {
        lock_unpoisoned(&self.values).get(key).cloned()
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, ProjectStoreError> {
        Ok(self.get_raw(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), ProjectStoreError> {
        self.insert_raw(key, value);
        Ok(())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
