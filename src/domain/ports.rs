//! Domain Ports - Backend contract consumed by the multi-storage layer
//!
//! These traits define the boundary between the routing/aliveness core and
//! concrete object storages. Adapters in [`crate::backends`] implement them;
//! the core never constructs a backend on its own.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::io::AsyncRead;

// =============================================================================
// Storage Names
// =============================================================================

/// Name of the primary storage in every configuration
pub const DEFAULT_STORAGE: &str = "default";

/// Pseudo storage name reported when an answer holds for every used storage
pub const ALL_STORAGES: &str = "all";

// =============================================================================
// Objects
// =============================================================================

/// An object found by listing a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Object {
    /// Name relative to the listed folder
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Time of the last modification
    pub last_modified: DateTime<Utc>,
    /// Storage the object was listed from (set by the multi-storage folder)
    pub storage: Option<String>,
}

impl Object {
    /// Create a new object description
    pub fn new(name: impl Into<String>, size: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            size,
            last_modified,
            storage: None,
        }
    }

    /// Tag the object with the storage it came from
    pub fn with_storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = Some(storage.into());
        self
    }

    /// Name of the storage holding this object
    pub fn storage_name(&self) -> &str {
        self.storage.as_deref().unwrap_or(DEFAULT_STORAGE)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} bytes, {})", self.name, self.size, self.storage_name())
    }
}

/// Stream with the content of an object
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Objects and sub-folders found in a folder
pub type FolderListing = (Vec<Object>, Vec<FolderRef>);

// =============================================================================
// Folder Trait (Port)
// =============================================================================

/// A folder in an object storage
///
/// Paths passed to the object operations are relative to [`Folder::path`].
#[async_trait]
pub trait Folder: Send + Sync + fmt::Debug {
    /// Path of this folder, relative to the storage root
    fn path(&self) -> &str;

    /// Folder nested at `relative_path` below this one
    fn sub_folder(&self, relative_path: &str) -> FolderRef;

    /// Check if an object exists
    async fn exists(&self, object_path: &str) -> Result<bool>;

    /// Open an object for reading
    ///
    /// Fails with [`crate::Error::ObjectNotFound`] if the object is absent.
    async fn read_object(&self, object_path: &str) -> Result<ObjectReader>;

    /// List objects and sub-folders directly inside this folder
    async fn list_folder(&self) -> Result<FolderListing>;

    /// Create or overwrite an object
    async fn put_object(&self, name: &str, content: Bytes) -> Result<()>;

    /// Delete objects; absent objects are skipped
    async fn delete_objects(&self, object_paths: &[String]) -> Result<()>;

    /// Copy an object inside this folder
    ///
    /// Fails with [`crate::Error::ObjectNotFound`] if the source is absent.
    async fn copy_object(&self, src_path: &str, dst_path: &str) -> Result<()>;
}

/// Type alias for Arc'd Folder
pub type FolderRef = Arc<dyn Folder>;

// =============================================================================
// Storage Trait (Port)
// =============================================================================

/// A configured object storage
#[async_trait]
pub trait Storage: Send + Sync {
    /// Root folder of the storage
    fn root_folder(&self) -> FolderRef;

    /// Fingerprint of the storage connection settings
    ///
    /// Two storages with equal hashes are considered the same endpoint.
    fn config_hash(&self) -> String;

    /// Release resources held by the storage
    async fn close(&self) -> Result<()>;
}

/// Type alias for Arc'd Storage
pub type StorageRef = Arc<dyn Storage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_storage_name() {
        let obj = Object::new("base_000", 10, Utc::now());
        assert_eq!(obj.storage_name(), DEFAULT_STORAGE);

        let obj = obj.with_storage("failover_1");
        assert_eq!(obj.storage_name(), "failover_1");
    }
}
