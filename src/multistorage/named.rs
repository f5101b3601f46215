//! Named Storage Registry
//!
//! Gives every configured storage a stable name and a cache key, and fixes
//! the priority order: `default` first, failovers sorted by key.

use crate::domain::ports::{FolderRef, StorageRef, DEFAULT_STORAGE};
use crate::stats::cache::Key;
use std::collections::HashMap;
use std::fmt;

/// A configured storage with its name and cache key
#[derive(Clone)]
pub struct NamedStorage {
    /// Unique among all configurations sharing a cache file
    pub key: Key,
    /// Unique within one configuration
    pub name: String,
    pub storage: StorageRef,
}

impl fmt::Debug for NamedStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedStorage")
            .field("key", &self.key.to_string())
            .field("name", &self.name)
            .finish()
    }
}

/// Storages in priority order
#[derive(Debug, Clone, Default)]
pub struct NamedStorages(Vec<NamedStorage>);

impl NamedStorages {
    /// Name and order the primary and failover storages
    pub fn name_and_order(primary: StorageRef, failovers: HashMap<String, StorageRef>) -> Self {
        let mut named_failovers: Vec<NamedStorage> = failovers
            .into_iter()
            .map(|(name, storage)| NamedStorage {
                key: Key::new(name.clone(), storage.config_hash()),
                name,
                storage,
            })
            .collect();
        named_failovers.sort_by_key(|s| s.key.to_string());

        let mut storages = Vec::with_capacity(named_failovers.len() + 1);
        storages.push(NamedStorage {
            key: Key::new(DEFAULT_STORAGE, primary.config_hash()),
            name: DEFAULT_STORAGE.to_string(),
            storage: primary,
        });
        storages.extend(named_failovers);
        Self(storages)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedStorage> {
        self.0.iter()
    }

    /// Names in priority order
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|s| s.name.clone()).collect()
    }

    /// Name -> cache key
    pub fn keys(&self) -> HashMap<String, Key> {
        self.0
            .iter()
            .map(|s| (s.name.clone(), s.key.clone()))
            .collect()
    }

    /// Name -> storage root folder
    pub fn root_folders(&self) -> HashMap<String, FolderRef> {
        self.0
            .iter()
            .map(|s| (s.name.clone(), s.storage.root_folder()))
            .collect()
    }
}

/// A folder of a specific storage
#[derive(Debug, Clone)]
pub struct NamedFolder {
    pub storage_name: String,
    pub folder: FolderRef,
}

impl NamedFolder {
    pub fn new(storage_name: impl Into<String>, folder: FolderRef) -> Self {
        Self {
            storage_name: storage_name.into(),
            folder,
        }
    }

    pub fn sub_folder(&self, relative_path: &str) -> Self {
        Self {
            storage_name: self.storage_name.clone(),
            folder: self.folder.sub_folder(relative_path),
        }
    }
}
