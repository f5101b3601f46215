//! Active Prober
//!
//! Checks storages concurrently within one shared timeout. Every storage is
//! probed in its own task; a task still running when the timeout fires is
//! aborted and its storage counts as dead, whatever it answers later.

use super::cache::AliveMap;
use super::metrics::StatsMetrics;
use crate::domain::ports::FolderRef;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Name of the object written by the write check
pub const ALIVE_CHECK_OBJECT: &str = ".multistorage_alive_check";

// =============================================================================
// Checks
// =============================================================================

/// A single check run against a storage root folder
#[async_trait]
pub trait StorageCheck: Send + Sync {
    async fn check(&self, folder: &FolderRef) -> Result<()>;
}

/// Lists the root folder
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadCheck;

#[async_trait]
impl StorageCheck for ReadCheck {
    async fn check(&self, folder: &FolderRef) -> Result<()> {
        folder.list_folder().await.map(|_| ())
    }
}

/// Writes a random probe object and deletes it
#[derive(Debug, Clone, Copy)]
pub struct WriteCheck {
    pub size: usize,
}

#[async_trait]
impl StorageCheck for WriteCheck {
    async fn check(&self, folder: &FolderRef) -> Result<()> {
        let mut content = vec![0u8; self.size];
        rand::thread_rng().fill(&mut content[..]);

        folder
            .put_object(ALIVE_CHECK_OBJECT, Bytes::from(content))
            .await?;
        folder
            .delete_objects(&[ALIVE_CHECK_OBJECT.to_string()])
            .await
    }
}

// =============================================================================
// Prober
// =============================================================================

/// Explicit aliveness probing
#[async_trait]
pub trait AliveProber: Send + Sync {
    /// Probe `names`; the result has one entry per requested name
    async fn check_for_alive(&self, names: &[String]) -> AliveMap;
}

/// Type alias for Arc'd AliveProber
pub type AliveProberRef = Arc<dyn AliveProber>;

/// [`AliveProber`] running [`StorageCheck`]s against storage root folders
pub struct AliveChecker {
    folders: HashMap<String, FolderRef>,
    timeout: Duration,
    checks: Arc<Vec<Box<dyn StorageCheck>>>,
    metrics: Option<Arc<StatsMetrics>>,
}

impl AliveChecker {
    pub fn new(
        folders: HashMap<String, FolderRef>,
        timeout: Duration,
        checks: Vec<Box<dyn StorageCheck>>,
    ) -> Self {
        Self {
            folders,
            timeout,
            checks: Arc::new(checks),
            metrics: None,
        }
    }

    /// Prober with the read check only
    pub fn read_only(folders: HashMap<String, FolderRef>, timeout: Duration) -> Self {
        Self::new(folders, timeout, vec![Box::new(ReadCheck)])
    }

    /// Prober with the read check followed by a write check of `write_bytes`
    pub fn read_write(
        folders: HashMap<String, FolderRef>,
        timeout: Duration,
        write_bytes: usize,
    ) -> Self {
        Self::new(
            folders,
            timeout,
            vec![Box::new(ReadCheck), Box::new(WriteCheck { size: write_bytes })],
        )
    }

    pub fn with_metrics(mut self, metrics: Arc<StatsMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

async fn run_checks(checks: &[Box<dyn StorageCheck>], folder: &FolderRef) -> Result<()> {
    for check in checks {
        check.check(folder).await?;
    }
    Ok(())
}

#[async_trait]
impl AliveProber for AliveChecker {
    async fn check_for_alive(&self, names: &[String]) -> AliveMap {
        let mut pending = FuturesUnordered::new();
        let mut abort_handles = Vec::with_capacity(names.len());

        for name in names {
            let Some(folder) = self.folders.get(name).cloned() else {
                warn!(storage = %name, "Cannot check unknown storage for aliveness");
                continue;
            };

            let checks = Arc::clone(&self.checks);
            let task = tokio::spawn(async move { run_checks(&checks, &folder).await });
            abort_handles.push(task.abort_handle());

            let name = name.clone();
            pending.push(task.map(move |joined| (name, joined)));
        }

        let mut finished: HashMap<String, bool> = HashMap::with_capacity(names.len());
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        while !pending.is_empty() {
            tokio::select! {
                biased;

                _ = &mut deadline => {
                    let unfinished: Vec<&String> = names
                        .iter()
                        .filter(|name| {
                            self.folders.contains_key(*name) && !finished.contains_key(*name)
                        })
                        .collect();
                    warn!(
                        timeout = ?self.timeout,
                        storages = ?unfinished,
                        "Storage alive check timed out, unfinished storages are considered dead"
                    );
                    break;
                }
                Some((name, joined)) = pending.next() => {
                    let outcome = joined
                        .map_err(|err| Error::AliveCheckFailed {
                            storage: name.clone(),
                            reason: err.to_string(),
                        })
                        .and_then(|checked| {
                            checked.map_err(|err| Error::AliveCheckFailed {
                                storage: name.clone(),
                                reason: err.to_string(),
                            })
                        });
                    if let Err(err) = &outcome {
                        warn!(error = %err, "Storage alive check failed");
                    }
                    finished.insert(name, outcome.is_ok());
                }
            }
        }

        // unfinished checks must not outlive the round
        for handle in abort_handles {
            handle.abort();
        }

        let alive_map: AliveMap = names
            .iter()
            .map(|name| (name.clone(), finished.get(name).copied().unwrap_or(false)))
            .collect();

        for (name, alive) in alive_map.iter() {
            debug!(storage = %name, alive = *alive, "Checked storage aliveness");
            if let Some(metrics) = &self.metrics {
                metrics.record_alive_check(name, *alive);
            }
        }
        alive_map
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryStorage;
    use crate::domain::ports::Storage;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn storages(count: usize) -> (Vec<String>, Vec<MemoryStorage>, HashMap<String, FolderRef>) {
        let names: Vec<String> = (1..=count).map(|i| format!("stor_{i}")).collect();
        let storages: Vec<MemoryStorage> = names.iter().map(|n| MemoryStorage::new(n.clone())).collect();
        let folders = names
            .iter()
            .zip(&storages)
            .map(|(n, s)| (n.clone(), s.root_folder()))
            .collect();
        (names, storages, folders)
    }

    #[tokio::test]
    async fn test_read_check() {
        let (names, storages, folders) = storages(2);
        storages[1].set_available(false);
        let checker = AliveChecker::read_only(folders, Duration::from_secs(5));

        let result = checker.check_for_alive(&names).await;
        assert_eq!(result.get("stor_1"), Some(true));
        assert_eq!(result.get("stor_2"), Some(false));
    }

    #[tokio::test]
    async fn test_write_check_cleans_up() {
        let (names, storages, folders) = storages(1);
        let checker = AliveChecker::read_write(folders, Duration::from_secs(5), 64);

        let result = checker.check_for_alive(&names).await;
        assert_eq!(result.get("stor_1"), Some(true));
        assert_eq!(storages[0].object_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_storage_is_dead() {
        let (_, _, folders) = storages(1);
        let checker = AliveChecker::read_only(folders, Duration::from_secs(5));

        let result = checker
            .check_for_alive(&["stor_1".to_string(), "stor_9".to_string()])
            .await;
        assert_eq!(result.len(), 2);
        assert_eq!(result.get("stor_9"), Some(false));
    }

    #[tokio::test]
    async fn test_timeout_marks_slow_storage_dead() {
        let (names, storages, folders) = storages(2);
        storages[0].set_latency(Duration::from_secs(30));
        let checker = AliveChecker::read_only(folders, Duration::from_millis(200));

        let started = std::time::Instant::now();
        let result = checker.check_for_alive(&names).await;
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(result.get("stor_1"), Some(false));
        assert_eq!(result.get("stor_2"), Some(true));
    }

    /// Passes after `delay`, recording that it got that far
    struct SlowCheck {
        delay: Duration,
        completed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl StorageCheck for SlowCheck {
        async fn check(&self, _folder: &FolderRef) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            self.completed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_late_answer_ignored_and_check_aborted() {
        let (names, _storages, folders) = storages(1);
        let completed = Arc::new(AtomicBool::new(false));
        let checker = AliveChecker::new(
            folders,
            Duration::from_millis(50),
            vec![Box::new(SlowCheck {
                delay: Duration::from_millis(150),
                completed: Arc::clone(&completed),
            })],
        );

        let result = checker.check_for_alive(&names).await;
        assert_eq!(result.get("stor_1"), Some(false));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!completed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_panicking_check_is_dead() {
        struct PanicCheck;

        #[async_trait]
        impl StorageCheck for PanicCheck {
            async fn check(&self, _folder: &FolderRef) -> Result<()> {
                panic!("check crashed");
            }
        }

        let (names, _storages, folders) = storages(2);
        let checker = AliveChecker::new(folders, Duration::from_secs(5), vec![Box::new(PanicCheck)]);
        let result = checker.check_for_alive(&names).await;
        assert_eq!(result.get("stor_1"), Some(false));
        assert_eq!(result.get("stor_2"), Some(false));
    }

    #[tokio::test]
    async fn test_metrics_recorded() {
        let (names, storages, folders) = storages(2);
        storages[0].set_available(false);
        let metrics = Arc::new(StatsMetrics::new().unwrap());
        let checker = AliveChecker::read_only(folders, Duration::from_secs(5))
            .with_metrics(Arc::clone(&metrics));

        checker.check_for_alive(&names).await;
        assert_eq!(metrics.alive_checks("stor_1", false), 1);
        assert_eq!(metrics.alive_checks("stor_2", true), 1);
    }
}
