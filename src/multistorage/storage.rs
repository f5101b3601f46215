//! Multi-storage composition root
//!
//! Names and orders the configured storages, then wires the aliveness cache,
//! the prober and the collector behind a root [`MultiFolder`].

use super::folder::MultiFolder;
use super::named::NamedStorages;
use super::policies::PolicyPreset;
use crate::domain::ports::{FolderRef, Storage, StorageRef};
use crate::error::{Error, Result};
use crate::stats::cache::default_file_path;
use crate::stats::{
    AliveChecker, AlivenessCache, AlivenessCollector, CacheConfig, CollectorRef, NopCollector,
    SharedFile, SharedMemories, StatsMetrics,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

// =============================================================================
// Configuration
// =============================================================================

/// Multi-storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiStorageConfig {
    /// Track storage aliveness; when off every storage is considered alive
    pub alive_checks: bool,
    /// Shared timeout of one probing round
    #[serde(with = "humantime_serde")]
    pub alive_check_timeout: Duration,
    /// Also probe writes (and use the read-write cache tiers)
    pub check_write: bool,
    /// Size of the object written by the write probe
    pub alive_check_write_bytes: usize,
    pub status_cache: CacheConfig,
    /// Status cache file; a dotfile in the home directory by default
    pub status_cache_file: Option<PathBuf>,
    /// Policies of the root folder
    pub policies: PolicyPreset,
}

impl Default for MultiStorageConfig {
    fn default() -> Self {
        Self {
            alive_checks: true,
            alive_check_timeout: Duration::from_secs(30),
            check_write: false,
            alive_check_write_bytes: 1024 * 1024,
            status_cache: CacheConfig::default(),
            status_cache_file: None,
            policies: PolicyPreset::default(),
        }
    }
}

// =============================================================================
// Multi Storage
// =============================================================================

/// Storage combining a primary storage with named failovers
pub struct MultiStorage {
    storages: NamedStorages,
    collector: CollectorRef,
    root: MultiFolder,
    metrics: Arc<StatsMetrics>,
}

impl MultiStorage {
    /// Wire up `primary` and `failovers`
    ///
    /// `memories` is the process-wide in-memory cache tier; pass the same
    /// instance to every multi-storage of one process.
    pub fn new(
        config: MultiStorageConfig,
        primary: StorageRef,
        failovers: HashMap<String, StorageRef>,
        memories: &SharedMemories,
    ) -> Result<Self> {
        let storages = NamedStorages::name_and_order(primary, failovers);
        let metrics = Arc::new(StatsMetrics::new()?);
        let names = storages.names();
        let roots = storages.root_folders();

        let collector: CollectorRef = if config.alive_checks {
            let file_path = config
                .status_cache_file
                .clone()
                .unwrap_or_else(|| default_file_path(config.check_write));
            let cache = AlivenessCache::new(
                storages.keys(),
                config.status_cache.clone(),
                memories.for_mode(config.check_write),
                Some(Arc::new(SharedFile::new(&file_path))),
            )?;

            let checker = if config.check_write {
                AliveChecker::read_write(
                    roots.clone(),
                    config.alive_check_timeout,
                    config.alive_check_write_bytes,
                )
            } else {
                AliveChecker::read_only(roots.clone(), config.alive_check_timeout)
            }
            .with_metrics(Arc::clone(&metrics));

            debug!(
                storages = ?names,
                cache_file = %file_path.display(),
                check_write = config.check_write,
                "Tracking storage aliveness"
            );
            Arc::new(
                AlivenessCollector::new(names.clone(), Arc::new(cache), Arc::new(checker))
                    .with_metrics(Arc::clone(&metrics)),
            )
        } else {
            debug!(storages = ?names, "Storage aliveness checks are disabled");
            Arc::new(NopCollector::new(names.clone()))
        };

        let root = MultiFolder::new(roots, Arc::clone(&collector))
            .with_policies(config.policies.policies());

        info!(storages = ?names, policies = %config.policies, "Multi-storage initialized");
        Ok(Self {
            storages,
            collector,
            root,
            metrics,
        })
    }

    /// Root folder using no storages yet
    pub fn root_multi_folder(&self) -> MultiFolder {
        self.root.clone()
    }

    pub fn collector(&self) -> &CollectorRef {
        &self.collector
    }

    pub fn storages(&self) -> &NamedStorages {
        &self.storages
    }

    pub fn metrics(&self) -> &Arc<StatsMetrics> {
        &self.metrics
    }

    /// Bring every storage status up to date and write them to the cache file
    ///
    /// Returns the alive storages in priority order.
    pub async fn refresh_statuses(&self) -> Result<Vec<String>> {
        let alive = self.collector.all_alive_storages().await?;
        self.collector.close().await?;
        Ok(alive)
    }
}

impl fmt::Debug for MultiStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiStorage")
            .field("storages", &self.storages)
            .field("root", &self.root)
            .finish()
    }
}

#[async_trait]
impl Storage for MultiStorage {
    fn root_folder(&self) -> FolderRef {
        Arc::new(self.root.clone())
    }

    fn config_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for storage in self.storages.iter() {
            hasher.update(storage.key.to_string().as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }

    /// Close every storage and persist the collected statistics
    async fn close(&self) -> Result<()> {
        let mut errors = Vec::new();
        for storage in self.storages.iter() {
            if let Err(err) = storage.storage.close().await {
                warn!(storage = %storage.name, error = %err, "Failed to close storage");
                errors.push(format!("close storage {:?}: {err}", storage.name));
            }
        }
        if let Err(err) = self.collector.close().await {
            errors.push(format!("close stats collector: {err}"));
        }

        if !errors.is_empty() {
            return Err(Error::CloseFailed { errors });
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
