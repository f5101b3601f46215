//! Aliveness Cache
//!
//! Two-tier cache of storage aliveness:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     AlivenessCache                           │
//! │  ┌────────────────────┐        ┌──────────────────────────┐  │
//! │  │   SharedMemory     │ merge  │       SharedFile         │  │
//! │  │ (process, mutex)   │◄──────►│ (all processes, flock)   │  │
//! │  └────────────────────┘        └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads are answered from memory while every requested status is relevant.
//! Otherwise the file is merged in, per key the most recently updated status
//! wins. Writes go to memory and reach the file at most once per flush
//! timeout, or unconditionally on [`StatusCache::flush`].

pub mod file;
pub mod key;
pub mod lock;
pub mod memory;
pub mod status;

pub use file::{default_file_path, SharedFile};
pub use key::Key;
pub use memory::{SharedMemories, SharedMemory};
pub use status::{AliveMap, EmaParams, StorageStatus, StorageStatuses};

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

// =============================================================================
// Cache Trait
// =============================================================================

/// Cached aliveness of the configured storages
#[async_trait]
pub trait StatusCache: Send + Sync {
    /// Read the statuses of `names`, split into relevant and outdated
    ///
    /// Names never seen before are reported as outdated and dead.
    async fn read(&self, names: &[String]) -> Result<(AliveMap, AliveMap)>;

    /// Apply explicit check results and return the new verdicts for `names`
    async fn apply_explicit_check_result(
        &self,
        check_result: &AliveMap,
        check_time: DateTime<Utc>,
        names: &[String],
    ) -> Result<AliveMap>;

    /// Apply the result of an ordinary operation with the given weight
    ///
    /// Unknown names are ignored. A due file write runs in the background
    /// when called inside a tokio runtime.
    fn apply_operation_result(&self, name: &str, alive: bool, weight: f64);

    /// Write the memory tier to the shared file
    async fn flush(&self);
}

/// Type alias for Arc'd StatusCache
pub type StatusCacheRef = Arc<dyn StatusCache>;

// =============================================================================
// Configuration
// =============================================================================

/// Status cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a status stays relevant
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    /// Minimum interval between two implicit file writes
    #[serde(with = "humantime_serde")]
    pub flush_timeout: Duration,
    /// EMA parameters
    pub ema: EmaParams,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            flush_timeout: Duration::from_secs(5 * 60),
            ema: EmaParams::default(),
        }
    }
}

// =============================================================================
// Aliveness Cache
// =============================================================================

/// [`StatusCache`] over a shared memory tier and an optional shared file
///
/// The file is only touched on the blocking thread pool and never while the
/// memory tier is locked.
pub struct AlivenessCache {
    /// Storage name -> cache key, for every name that may be requested
    used_keys: HashMap<String, Key>,
    config: CacheConfig,
    memory: Arc<SharedMemory>,
    file: Option<Arc<SharedFile>>,
}

/// File write due after a memory update
type PendingFlush = (Arc<SharedFile>, StorageStatuses);

impl AlivenessCache {
    /// Create a cache; fails on invalid EMA parameters
    pub fn new(
        used_keys: HashMap<String, Key>,
        config: CacheConfig,
        memory: Arc<SharedMemory>,
        file: Option<Arc<SharedFile>>,
    ) -> Result<Self> {
        config
            .ema
            .validate()
            .map_err(|e| Error::Configuration(format!("invalid EMA params: {e}")))?;
        Ok(Self {
            used_keys,
            config,
            memory,
            file,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn corresponding_keys(&self, names: &[String]) -> Result<Vec<Key>> {
        names
            .iter()
            .map(|name| {
                self.used_keys
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::UnknownStorage { name: name.clone() })
            })
            .collect()
    }

    /// Snapshot of `memory` to write, unless this process wrote recently
    fn due_flush(&self, memory: &StorageStatuses) -> Option<PendingFlush> {
        let file = self.file.as_ref()?;
        file.claim_flush(self.config.flush_timeout)
            .then(|| (Arc::clone(file), memory.clone()))
    }

    async fn read_file(file: Arc<SharedFile>) -> StorageStatuses {
        let path = file.path().to_path_buf();
        let result = tokio::task::spawn_blocking(move || file.read())
            .await
            .map_err(|err| Error::Internal(format!("status cache read task: {err}")))
            .and_then(|read| read);
        result.unwrap_or_else(|err| {
            warn!(
                path = %path.display(),
                error = %err,
                "Failed to read storage status cache file"
            );
            StorageStatuses::new()
        })
    }

    async fn write_file(file: Arc<SharedFile>, memory: StorageStatuses) {
        let task = tokio::task::spawn_blocking(move || write_file_blocking(&file, &memory));
        if let Err(err) = task.await {
            warn!(error = %err, "Storage status cache flush task failed");
        }
    }
}

fn write_file_blocking(file: &SharedFile, memory: &StorageStatuses) {
    match file.merge_and_write(memory) {
        Ok(merged) => debug!(
            path = %file.path().display(),
            statuses = merged.len(),
            "Flushed storage status cache file"
        ),
        Err(err) => warn!(
            path = %file.path().display(),
            error = %err,
            "Failed to flush storage status cache file"
        ),
    }
}

impl fmt::Debug for AlivenessCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlivenessCache")
            .field("used_keys", &self.used_keys)
            .field("config", &self.config)
            .field("file", &self.file.as_ref().map(|file| file.path()))
            .finish()
    }
}

#[async_trait]
impl StatusCache for AlivenessCache {
    async fn read(&self, names: &[String]) -> Result<(AliveMap, AliveMap)> {
        let keys = self.corresponding_keys(names)?;
        let params = &self.config.ema;

        {
            let memory = self.memory.lock();
            if memory.is_relevant(self.config.ttl, &keys, Utc::now()) {
                return Ok((memory.filter(&keys).alive_map(params), AliveMap::new()));
            }
        }

        let file_statuses = match &self.file {
            Some(file) => Self::read_file(Arc::clone(file)).await,
            None => StorageStatuses::new(),
        };

        let mut memory = self.memory.lock();
        let merged = StorageStatuses::merge_by_relevance(&memory, &file_statuses);
        let (relevant, outdated) = merged.split_by_relevance(self.config.ttl, &keys, Utc::now());
        *memory = merged;

        Ok((relevant.alive_map(params), outdated.alive_map(params)))
    }

    async fn apply_explicit_check_result(
        &self,
        check_result: &AliveMap,
        check_time: DateTime<Utc>,
        names: &[String],
    ) -> Result<AliveMap> {
        let keys = self.corresponding_keys(names)?;
        let by_keys: HashMap<Key, bool> = self
            .used_keys
            .values()
            .filter_map(|key| check_result.get(&key.name).map(|alive| (key.clone(), alive)))
            .collect();

        let (alive_map, pending) = {
            let mut memory = self.memory.lock();
            memory.apply_explicit_check_result(&by_keys, check_time);
            (
                memory.filter(&keys).alive_map(&self.config.ema),
                self.due_flush(&memory),
            )
        };

        if let Some((file, snapshot)) = pending {
            Self::write_file(file, snapshot).await;
        }
        Ok(alive_map)
    }

    fn apply_operation_result(&self, name: &str, alive: bool, weight: f64) {
        let Some(key) = self.used_keys.get(name) else {
            return;
        };

        let pending = {
            let mut memory = self.memory.lock();
            let status = memory.status_or_default(key).apply_operation_result(
                &self.config.ema,
                alive,
                weight,
                Utc::now(),
            );
            trace!(
                storage = %name,
                alive,
                weight,
                actual = status.actual_aliveness,
                potential = status.potential_aliveness,
                "Applied storage operation result"
            );
            memory.insert(key.clone(), status);
            self.due_flush(&memory)
        };

        let Some((file, snapshot)) = pending else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || write_file_blocking(&file, &snapshot));
            }
            Err(_) => write_file_blocking(&file, &snapshot),
        }
    }

    async fn flush(&self) {
        let Some(file) = &self.file else {
            return;
        };
        let snapshot = self.memory.lock().clone();
        Self::write_file(Arc::clone(file), snapshot).await;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    struct TestCache {
        cache: AlivenessCache,
        memory: Arc<SharedMemory>,
        file: Option<Arc<SharedFile>>,
        _temp_dir: TempDir,
    }

    fn key(name: &str) -> Key {
        Key::new(name, format!("{name}_hash"))
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn alive_map(entries: &[(&str, bool)]) -> AliveMap {
        entries.iter().map(|(name, alive)| (*name, *alive)).collect()
    }

    /// Status updated now (relevant) or two hours ago (outdated, TTL is one hour)
    fn status(alive: bool, relevant: bool) -> StorageStatus {
        let updated = if relevant {
            Utc::now()
        } else {
            Utc::now() - chrono::Duration::hours(2)
        };
        StorageStatus::checked(alive, 100.0, updated)
    }

    fn statuses(entries: &[(&str, StorageStatus)]) -> StorageStatuses {
        entries
            .iter()
            .map(|(name, status)| (key(name), status.clone()))
            .collect()
    }

    fn new_test_cache(failovers: usize, use_file: bool, flush_timeout: Duration) -> TestCache {
        let temp_dir = TempDir::new().unwrap();
        let mut used_keys = HashMap::from([("def".to_string(), key("def"))]);
        for i in 1..=failovers {
            let name = format!("fo{i}");
            used_keys.insert(name.clone(), key(&name));
        }
        let memory = Arc::new(SharedMemory::new());
        let file = use_file.then(|| Arc::new(SharedFile::new(temp_dir.path().join("status_cache"))));
        let config = CacheConfig {
            ttl: Duration::from_secs(3600),
            flush_timeout,
            ema: EmaParams::default(),
        };
        let cache = AlivenessCache::new(used_keys, config, memory.clone(), file.clone()).unwrap();
        TestCache {
            cache,
            memory,
            file,
            _temp_dir: temp_dir,
        }
    }

    impl TestCache {
        fn file(&self) -> &SharedFile {
            self.file.as_deref().unwrap()
        }

        fn file_alive_map(&self) -> AliveMap {
            self.file().read().unwrap().alive_map(&EmaParams::default())
        }

        fn memory_alive_map(&self) -> AliveMap {
            self.memory.lock().alive_map(&EmaParams::default())
        }
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_invalid_ema_params() {
        let config = CacheConfig {
            ema: EmaParams {
                alive_limit: 1.5,
                alpha: 0.04,
            },
            ..Default::default()
        };
        let result = AlivenessCache::new(HashMap::new(), config, Arc::new(SharedMemory::new()), None);
        assert_matches!(result, Err(Error::Configuration(_)));
    }

    #[tokio::test]
    async fn test_read_from_memory_when_relevant() {
        let c = new_test_cache(1, false, HOUR);
        *c.memory.lock() = statuses(&[("def", status(true, true)), ("fo1", status(false, true))]);

        let (relevant, outdated) = c.cache.read(&names(&["def", "fo1"])).await.unwrap();
        assert_eq!(relevant, alive_map(&[("def", true), ("fo1", false)]));
        assert!(outdated.is_empty());
    }

    #[tokio::test]
    async fn test_read_merges_file_when_memory_outdated() {
        let c = new_test_cache(2, true, HOUR);
        *c.memory.lock() = statuses(&[
            ("def", status(true, false)),
            ("fo1", status(false, true)),
            ("fo2", status(false, false)),
        ]);
        std::thread::sleep(Duration::from_millis(2));
        c.file()
            .write(&statuses(&[("def", status(false, true)), ("fo1", status(true, true))]))
            .unwrap();

        let (relevant, outdated) = c.cache.read(&names(&["def", "fo1", "fo2"])).await.unwrap();
        assert_eq!(relevant, alive_map(&[("def", false), ("fo1", true)]));
        assert_eq!(outdated, alive_map(&[("fo2", false)]));
    }

    #[tokio::test]
    async fn test_read_outdated_memory_without_file() {
        let c = new_test_cache(1, false, HOUR);
        *c.memory.lock() = statuses(&[("def", status(true, true)), ("fo1", status(false, false))]);

        let (relevant, outdated) = c.cache.read(&names(&["def", "fo1"])).await.unwrap();
        assert_eq!(relevant, alive_map(&[("def", true)]));
        assert_eq!(outdated, alive_map(&[("fo1", false)]));
    }

    #[tokio::test]
    async fn test_read_empty_cache_is_all_outdated() {
        let c = new_test_cache(2, true, HOUR);
        let (relevant, outdated) = c.cache.read(&names(&["def", "fo1", "fo2"])).await.unwrap();
        assert!(relevant.is_empty());
        assert_eq!(
            outdated,
            alive_map(&[("def", false), ("fo1", false), ("fo2", false)])
        );
    }

    #[tokio::test]
    async fn test_read_malformed_file_is_empty() {
        let c = new_test_cache(0, true, HOUR);
        std::fs::write(c.file().path(), "][").unwrap();
        let (relevant, outdated) = c.cache.read(&names(&["def"])).await.unwrap();
        assert!(relevant.is_empty());
        assert_eq!(outdated, alive_map(&[("def", false)]));
    }

    #[tokio::test]
    async fn test_read_only_requested_names() {
        let c = new_test_cache(3, true, HOUR);
        *c.memory.lock() = statuses(&[
            ("def", status(true, true)),
            ("fo1", status(true, false)),
            ("fo3", status(false, true)),
        ]);
        c.file()
            .write(&statuses(&[
                ("def", status(false, true)),
                ("fo2", status(true, false)),
                ("fo3", status(true, true)),
            ]))
            .unwrap();

        let (relevant, outdated) = c.cache.read(&names(&["def", "fo1", "fo2"])).await.unwrap();
        let mut relevant_names = relevant.names();
        relevant_names.sort();
        let mut outdated_names = outdated.names();
        outdated_names.sort();
        assert_eq!(relevant_names, names(&["def"]));
        assert_eq!(outdated_names, names(&["fo1", "fo2"]));
    }

    #[tokio::test]
    async fn test_locked_file_does_not_stall_runtime() {
        let c = new_test_cache(1, true, HOUR);
        c.file().write(&StorageStatuses::new()).unwrap();

        let path = c.file().path().to_path_buf();
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        let holder = std::thread::spawn(move || {
            let file = std::fs::File::open(path).unwrap();
            let _lock = lock::lock_file(&file, true).unwrap();
            locked_tx.send(()).unwrap();
            std::thread::sleep(Duration::from_secs(1));
        });
        locked_rx.recv().unwrap();

        let started = std::time::Instant::now();
        let read = tokio::time::timeout(
            Duration::from_millis(200),
            c.cache.read(&names(&["def", "fo1"])),
        )
        .await;
        assert!(read.is_err());
        assert!(started.elapsed() < Duration::from_millis(900));
        assert!(c.memory.try_lock().is_some());

        holder.join().unwrap();
        let (_, outdated) = c.cache.read(&names(&["def", "fo1"])).await.unwrap();
        assert_eq!(outdated, alive_map(&[("def", false), ("fo1", false)]));
    }

    #[tokio::test]
    async fn test_read_unknown_storage() {
        let c = new_test_cache(1, false, HOUR);
        assert_matches!(
            c.cache.read(&names(&["def", "fo1", "fo2"])).await,
            Err(Error::UnknownStorage { name }) if name == "fo2"
        );
        assert!(c.cache.read(&[]).await.unwrap().0.is_empty());
    }

    #[tokio::test]
    async fn test_explicit_check_applies_to_memory() {
        let c = new_test_cache(2, false, HOUR);
        let check = alive_map(&[("def", true), ("fo1", false), ("fo2", true)]);
        c.cache
            .apply_explicit_check_result(&check, Utc::now(), &[])
            .await
            .unwrap();
        assert_eq!(c.memory_alive_map(), check);
    }

    #[tokio::test]
    async fn test_explicit_check_applies_to_file_when_flush_timeout_exceeded() {
        let c = new_test_cache(2, true, Duration::ZERO);
        c.file().write(&StorageStatuses::new()).unwrap();
        let check = alive_map(&[("def", true), ("fo1", false), ("fo2", true)]);
        c.cache
            .apply_explicit_check_result(&check, Utc::now(), &[])
            .await
            .unwrap();
        assert_eq!(c.file_alive_map(), check);
    }

    #[tokio::test]
    async fn test_explicit_check_applies_to_file_when_never_flushed() {
        let c = new_test_cache(2, true, HOUR);
        let check = alive_map(&[("def", true), ("fo1", false), ("fo2", true)]);
        c.cache
            .apply_explicit_check_result(&check, Utc::now(), &[])
            .await
            .unwrap();
        assert_eq!(c.file_alive_map(), check);
    }

    #[tokio::test]
    async fn test_explicit_check_skips_file_within_flush_timeout() {
        let c = new_test_cache(2, true, HOUR);
        c.file().write(&StorageStatuses::new()).unwrap();
        let check = alive_map(&[("def", true), ("fo1", false), ("fo2", true)]);
        c.cache
            .apply_explicit_check_result(&check, Utc::now(), &[])
            .await
            .unwrap();
        assert!(c.file_alive_map().is_empty());
    }

    #[tokio::test]
    async fn test_explicit_check_merges_memory_and_file() {
        let c = new_test_cache(3, true, Duration::ZERO);
        *c.memory.lock() = statuses(&[
            ("def", status(false, false)),
            ("fo1", status(false, true)),
            ("fo2", status(true, false)),
        ]);
        c.file()
            .write(&statuses(&[
                ("def", status(true, true)),
                ("fo1", status(true, false)),
                ("fo2", status(false, true)),
                ("fo3", status(false, false)),
            ]))
            .unwrap();

        let check = alive_map(&[("def", true), ("fo2", true)]);
        c.cache
            .apply_explicit_check_result(&check, Utc::now(), &[])
            .await
            .unwrap();

        assert_eq!(
            c.memory_alive_map(),
            alive_map(&[("def", true), ("fo1", false), ("fo2", true)])
        );
        assert_eq!(
            c.file_alive_map(),
            alive_map(&[("def", true), ("fo1", false), ("fo2", true), ("fo3", false)])
        );
    }

    #[tokio::test]
    async fn test_explicit_check_returns_requested_names() {
        let c = new_test_cache(2, false, HOUR);
        *c.memory.lock() = statuses(&[
            ("def", status(false, false)),
            ("fo1", status(true, true)),
            ("fo2", status(false, false)),
        ]);
        let check = alive_map(&[("def", true), ("fo1", false), ("fo2", true)]);
        let got = c
            .cache
            .apply_explicit_check_result(&check, Utc::now(), &names(&["def", "fo1"]))
            .await
            .unwrap();
        assert_eq!(got, alive_map(&[("def", true), ("fo1", false)]));
    }

    #[tokio::test]
    async fn test_explicit_check_is_hard_reset_in_cache() {
        let c = new_test_cache(0, false, HOUR);
        for _ in 0..10 {
            c.cache.apply_operation_result("def", false, 100.0);
        }
        c.cache
            .apply_explicit_check_result(&alive_map(&[("def", true)]), Utc::now(), &[])
            .await
            .unwrap();
        let memory = c.memory.lock();
        let status = memory.get(&key("def")).unwrap();
        assert_eq!(status.actual_aliveness, status.potential_aliveness);
    }

    #[test]
    fn test_operation_result_applies_to_memory() {
        let c = new_test_cache(0, false, HOUR);
        c.cache.apply_operation_result("def", true, 100.0);
        assert_eq!(c.memory_alive_map(), alive_map(&[("def", true)]));
    }

    #[test]
    fn test_operation_result_applies_to_file_when_flush_timeout_exceeded() {
        let c = new_test_cache(1, true, Duration::ZERO);
        c.cache.apply_operation_result("fo1", true, 100.0);
        assert_eq!(c.file_alive_map().get("fo1"), Some(true));
    }

    #[test]
    fn test_operation_result_applies_to_file_when_never_flushed() {
        let c = new_test_cache(1, true, HOUR);
        c.cache.apply_operation_result("fo1", true, 100.0);
        assert_eq!(c.file_alive_map().get("fo1"), Some(true));
    }

    #[test]
    fn test_operation_result_skips_file_within_flush_timeout() {
        let c = new_test_cache(1, true, HOUR);
        c.file().write(&StorageStatuses::new()).unwrap();
        c.cache.apply_operation_result("fo1", true, 100.0);
        assert!(!c.file_alive_map().contains("fo1"));
    }

    #[test]
    fn test_operation_result_ignores_unknown_storage() {
        let c = new_test_cache(1, true, Duration::ZERO);
        c.file().write(&StorageStatuses::new()).unwrap();
        c.cache.apply_operation_result("fo2", true, 100.0);
        assert!(!c.memory.lock().contains(&key("fo2")));
        assert!(!c.file_alive_map().contains("fo2"));
    }

    #[test]
    fn test_operation_result_merges_memory_and_file() {
        let c = new_test_cache(3, true, Duration::ZERO);
        *c.memory.lock() = statuses(&[
            ("def", status(false, false)),
            ("fo1", status(false, true)),
            ("fo2", status(false, true)),
        ]);
        c.file()
            .write(&statuses(&[
                ("def", status(true, true)),
                ("fo1", status(true, false)),
                ("fo2", status(false, false)),
                ("fo3", status(true, false)),
            ]))
            .unwrap();

        c.cache.apply_operation_result("fo2", false, 100.0);

        assert_eq!(
            c.memory_alive_map(),
            alive_map(&[("def", false), ("fo1", false), ("fo2", false)])
        );
        assert_eq!(
            c.file_alive_map(),
            alive_map(&[("def", true), ("fo1", false), ("fo2", false), ("fo3", true)])
        );
    }

    #[tokio::test]
    async fn test_flush_without_file_releases_lock() {
        let c = new_test_cache(0, false, HOUR);
        *c.memory.lock() = statuses(&[("def", status(true, true))]);
        c.cache.flush().await;
        assert!(c.memory.try_lock().is_some());
    }

    #[tokio::test]
    async fn test_flush_creates_empty_file() {
        let c = new_test_cache(0, true, HOUR);
        c.cache.flush().await;
        assert!(c.file().path().exists());
        assert!(c.file_alive_map().is_empty());
    }

    #[tokio::test]
    async fn test_flush_merges_file_and_memory() {
        let c = new_test_cache(3, true, HOUR);
        *c.memory.lock() = statuses(&[
            ("def", status(true, true)),
            ("fo1", status(true, false)),
            ("fo2", status(true, false)),
        ]);
        c.file()
            .write(&statuses(&[
                ("def", status(false, false)),
                ("fo1", status(false, true)),
                ("fo3", status(false, false)),
            ]))
            .unwrap();

        c.cache.flush().await;

        assert_eq!(
            c.file_alive_map(),
            alive_map(&[("def", true), ("fo1", false), ("fo2", true), ("fo3", false)])
        );
    }

    #[tokio::test]
    async fn test_file_round_trip_through_second_cache() {
        let c = new_test_cache(2, true, HOUR);
        let check = alive_map(&[("def", false), ("fo1", true), ("fo2", true)]);
        c.cache
            .apply_explicit_check_result(&check, Utc::now(), &[])
            .await
            .unwrap();
        c.cache.flush().await;

        let used_keys: HashMap<String, Key> = ["def", "fo1", "fo2"]
            .iter()
            .map(|n| (n.to_string(), key(n)))
            .collect();
        let other = AlivenessCache::new(
            used_keys,
            c.cache.config().clone(),
            Arc::new(SharedMemory::new()),
            c.file.clone(),
        )
        .unwrap();
        let (relevant, outdated) = other.read(&names(&["def", "fo1", "fo2"])).await.unwrap();
        assert_eq!(relevant, check);
        assert!(outdated.is_empty());
    }
}
