//! Storage Backend Adapters
//!
//! Provides adapters implementing the [`Storage`] port:
//! - Memory: DashMap-backed scratch storage with outage simulation
//! - Fs: local directory tree

pub mod fs;
pub mod memory;

pub use fs::*;
pub use memory::*;

use crate::domain::ports::{Storage, StorageRef};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Backend configuration, tagged by backend type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// In-memory storage
    Memory {
        #[serde(default)]
        id: String,
    },
    /// Local directory
    Fs { root: PathBuf },
}

impl BackendConfig {
    /// Backend type name
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Memory { .. } => "memory",
            BackendConfig::Fs { .. } => "fs",
        }
    }
}

/// Factory for creating storage backend adapters
pub struct BackendFactory;

impl BackendFactory {
    /// Create a backend from its configuration
    pub async fn create(config: &BackendConfig) -> Result<StorageRef> {
        let storage: StorageRef = match config {
            BackendConfig::Memory { id } => Arc::new(MemoryStorage::new(id.clone())),
            BackendConfig::Fs { root } => Arc::new(FsStorage::open(root.clone()).await?),
        };
        tracing::debug!(
            backend = config.kind(),
            hash = %storage.config_hash(),
            "Created storage backend"
        );
        Ok(storage)
    }
}
