//! In-Memory Storage Backend
//!
//! Object storage kept in a DashMap, used by tests and as a scratch backend.
//! Availability and latency can be switched at runtime to simulate outages.

use crate::domain::path::{join_path, sub_folder_path};
use crate::domain::ports::{Folder, FolderListing, FolderRef, Object, ObjectReader, Storage};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// Shared State
// =============================================================================

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    modified: DateTime<Utc>,
}

#[derive(Debug)]
struct MemoryState {
    id: String,
    objects: DashMap<String, StoredObject>,
    available: AtomicBool,
    latency_ms: AtomicU64,
}

impl MemoryState {
    async fn enter(&self) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if !self.available.load(Ordering::Relaxed) {
            return Err(Error::BackendUnavailable {
                backend: format!("memory:{}", self.id),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Memory Storage
// =============================================================================

/// Object storage held entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    state: Arc<MemoryState>,
}

impl MemoryStorage {
    /// Create an empty storage identified by `id`
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            state: Arc::new(MemoryState {
                id: id.into(),
                objects: DashMap::new(),
                available: AtomicBool::new(true),
                latency_ms: AtomicU64::new(0),
            }),
        }
    }

    /// Identifier of this storage
    pub fn id(&self) -> &str {
        &self.state.id
    }

    /// Make every operation fail (or succeed again)
    pub fn set_available(&self, available: bool) {
        self.state.available.store(available, Ordering::Relaxed);
    }

    /// Check if available
    pub fn is_available(&self) -> bool {
        self.state.available.load(Ordering::Relaxed)
    }

    /// Delay every operation by `latency`
    pub fn set_latency(&self, latency: Duration) {
        self.state
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Number of stored objects
    pub fn object_count(&self) -> usize {
        self.state.objects.len()
    }

    /// Full path of every stored object, sorted
    pub fn object_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.state.objects.iter().map(|r| r.key().clone()).collect();
        paths.sort();
        paths
    }

    /// Folder at `path` below the storage root
    pub fn folder(&self, path: &str) -> MemoryFolder {
        MemoryFolder {
            path: sub_folder_path("", path),
            state: Arc::clone(&self.state),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn root_folder(&self) -> FolderRef {
        Arc::new(self.folder(""))
    }

    fn config_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"memory:");
        hasher.update(self.state.id.as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Memory Folder
// =============================================================================

/// Folder view into a [`MemoryStorage`]
#[derive(Debug, Clone)]
pub struct MemoryFolder {
    path: String,
    state: Arc<MemoryState>,
}

impl MemoryFolder {
    fn full_path(&self, object_path: &str) -> String {
        join_path(&self.path, object_path)
    }
}

#[async_trait]
impl Folder for MemoryFolder {
    fn path(&self) -> &str {
        &self.path
    }

    fn sub_folder(&self, relative_path: &str) -> FolderRef {
        Arc::new(MemoryFolder {
            path: sub_folder_path(&self.path, relative_path),
            state: Arc::clone(&self.state),
        })
    }

    async fn exists(&self, object_path: &str) -> Result<bool> {
        self.state.enter().await?;
        Ok(self.state.objects.contains_key(&self.full_path(object_path)))
    }

    async fn read_object(&self, object_path: &str) -> Result<ObjectReader> {
        self.state.enter().await?;
        let full_path = self.full_path(object_path);
        match self.state.objects.get(&full_path) {
            Some(obj) => Ok(Box::new(Cursor::new(obj.data.clone()))),
            None => Err(Error::not_found(full_path)),
        }
    }

    async fn list_folder(&self) -> Result<FolderListing> {
        self.state.enter().await?;

        let mut objects = Vec::new();
        let mut sub_names = BTreeSet::new();
        for entry in self.state.objects.iter() {
            let Some(rest) = entry.key().strip_prefix(self.path.as_str()) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    sub_names.insert(dir.to_string());
                }
                None => objects.push(Object::new(
                    rest,
                    entry.value().data.len() as u64,
                    entry.value().modified,
                )),
            }
        }
        objects.sort_by(|a, b| a.name.cmp(&b.name));

        let folders = sub_names
            .into_iter()
            .map(|name| self.sub_folder(&name))
            .collect();
        Ok((objects, folders))
    }

    async fn put_object(&self, name: &str, content: Bytes) -> Result<()> {
        self.state.enter().await?;
        self.state.objects.insert(
            self.full_path(name),
            StoredObject {
                data: content,
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete_objects(&self, object_paths: &[String]) -> Result<()> {
        self.state.enter().await?;
        for path in object_paths {
            self.state.objects.remove(&self.full_path(path));
        }
        Ok(())
    }

    async fn copy_object(&self, src_path: &str, dst_path: &str) -> Result<()> {
        self.state.enter().await?;
        let src = self.full_path(src_path);
        let data = match self.state.objects.get(&src) {
            Some(obj) => obj.data.clone(),
            None => return Err(Error::not_found(src)),
        };
        self.state.objects.insert(
            self.full_path(dst_path),
            StoredObject {
                data,
                modified: Utc::now(),
            },
        );
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
