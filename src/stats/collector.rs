//! Aliveness Collector
//!
//! Answers which storages are alive, from the cache when possible, probing
//! otherwise. Probing escalates in fixed stages:
//!
//! ```text
//! UseCache ──► ProbeOutdated ──► ProbeRelevant ──► Done
//!    │              │                  │
//!    └── answer ────┴──── answer ──────┘──► Done
//! ```
//!
//! Outdated storages are probed first since their cached verdict is not
//! trusted. Relevant ones are probed only when nothing alive was found, so a
//! call never reports "no alive storages" without having checked every one.

use super::cache::{AliveMap, StatusCacheRef};
use super::checker::AliveProberRef;
use super::metrics::StatsMetrics;
use super::operation::OperationWeight;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// Collector Trait
// =============================================================================

/// Aliveness-aware storage selection
#[async_trait]
pub trait Collector: Send + Sync {
    /// All alive storages in priority order, possibly none
    async fn all_alive_storages(&self) -> Result<Vec<String>>;

    /// The first alive storage in priority order
    async fn first_alive_storage(&self) -> Result<Option<String>>;

    /// Check if a specific storage is alive
    async fn specific_storage(&self, name: &str) -> Result<bool>;

    /// Passive signal from an ordinary storage operation
    fn report_operation_result(&self, storage: &str, weight: OperationWeight, success: bool);

    /// Persist collected statistics
    async fn close(&self) -> Result<()>;
}

/// Type alias for Arc'd Collector
pub type CollectorRef = Arc<dyn Collector>;

// =============================================================================
// Escalation Stages
// =============================================================================

/// Stage of the probing escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    /// Answer from relevant cached statuses
    UseCache,
    /// Probe storages with outdated statuses
    ProbeOutdated,
    /// Probe storages with relevant statuses too
    ProbeRelevant,
    /// Nothing more to try
    Done,
}

impl ProbeStage {
    /// Stage following this one, `Done` once an answer is found
    pub fn next(self, found: bool) -> Self {
        if found {
            return ProbeStage::Done;
        }
        match self {
            ProbeStage::UseCache => ProbeStage::ProbeOutdated,
            ProbeStage::ProbeOutdated => ProbeStage::ProbeRelevant,
            ProbeStage::ProbeRelevant | ProbeStage::Done => ProbeStage::Done,
        }
    }
}

// =============================================================================
// Aliveness Collector
// =============================================================================

/// [`Collector`] backed by a status cache and a prober
pub struct AlivenessCollector {
    storages_in_order: Vec<String>,
    cache: StatusCacheRef,
    prober: AliveProberRef,
    metrics: Option<Arc<StatsMetrics>>,
}

impl AlivenessCollector {
    pub fn new(storages_in_order: Vec<String>, cache: StatusCacheRef, prober: AliveProberRef) -> Self {
        Self {
            storages_in_order,
            cache,
            prober,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<StatsMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Probe `names` and fold the result into the cache
    ///
    /// Returns the cached verdicts of every configured storage afterwards.
    async fn probe_and_apply(&self, names: &[String]) -> Result<AliveMap> {
        let check_result = if names.is_empty() {
            AliveMap::new()
        } else {
            debug!(storages = ?names, "Probing storages for aliveness");
            self.prober.check_for_alive(names).await
        };
        self.cache
            .apply_explicit_check_result(&check_result, Utc::now(), &self.storages_in_order)
            .await
    }

    /// Walk the escalation stages until `select` finds an answer
    ///
    /// `use_cache` tells whether the relevant cached statuses may answer.
    async fn escalate<T>(
        &self,
        relevant: &AliveMap,
        outdated: &AliveMap,
        use_cache: bool,
        select: impl Fn(&AliveMap) -> Option<T> + Send,
    ) -> Result<Option<T>> {
        let mut stage = ProbeStage::UseCache;
        while stage != ProbeStage::Done {
            let view = match stage {
                ProbeStage::UseCache if use_cache => relevant.clone(),
                ProbeStage::UseCache => AliveMap::new(),
                ProbeStage::ProbeOutdated => {
                    self.probe_and_apply(&outdated.present_names(&self.storages_in_order))
                        .await?
                }
                ProbeStage::ProbeRelevant => {
                    self.probe_and_apply(&relevant.present_names(&self.storages_in_order))
                        .await?
                }
                ProbeStage::Done => break,
            };
            if let Some(answer) = select(&view) {
                debug!(stage = ?stage, "Found alive storages");
                return Ok(Some(answer));
            }
            stage = stage.next(false);
        }
        Ok(None)
    }
}

#[async_trait]
impl Collector for AlivenessCollector {
    async fn all_alive_storages(&self) -> Result<Vec<String>> {
        let (relevant, outdated) = self.cache.read(&self.storages_in_order).await?;
        let order = &self.storages_in_order;
        let alive = self
            .escalate(&relevant, &outdated, outdated.is_empty(), |view| {
                let alive = view.alive_names(order);
                (!alive.is_empty()).then_some(alive)
            })
            .await?;
        Ok(alive.unwrap_or_default())
    }

    async fn first_alive_storage(&self) -> Result<Option<String>> {
        let (relevant, outdated) = self.cache.read(&self.storages_in_order).await?;
        let order = &self.storages_in_order;
        self.escalate(&relevant, &outdated, true, |view| view.first_alive(order))
            .await
    }

    async fn specific_storage(&self, name: &str) -> Result<bool> {
        let names = vec![name.to_string()];
        let (relevant, _) = self.cache.read(&names).await?;
        if relevant.get(name) == Some(true) {
            return Ok(true);
        }

        let check_result = self.prober.check_for_alive(&names).await;
        let after = self
            .cache
            .apply_explicit_check_result(&check_result, Utc::now(), &names)
            .await?;
        Ok(after.get(name).unwrap_or(false))
    }

    fn report_operation_result(&self, storage: &str, weight: OperationWeight, success: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_operation_report(storage, success);
        }
        self.cache
            .apply_operation_result(storage, success, weight.value());
    }

    async fn close(&self) -> Result<()> {
        self.cache.flush().await;
        Ok(())
    }
}

// =============================================================================
// Nop Collector
// =============================================================================

/// [`Collector`] considering every configured storage alive
#[derive(Debug, Clone)]
pub struct NopCollector {
    storages_in_order: Vec<String>,
}

impl NopCollector {
    pub fn new(storages_in_order: Vec<String>) -> Self {
        Self { storages_in_order }
    }
}

#[async_trait]
impl Collector for NopCollector {
    async fn all_alive_storages(&self) -> Result<Vec<String>> {
        Ok(self.storages_in_order.clone())
    }

    async fn first_alive_storage(&self) -> Result<Option<String>> {
        Ok(self.storages_in_order.first().cloned())
    }

    async fn specific_storage(&self, name: &str) -> Result<bool> {
        if self.storages_in_order.iter().any(|s| s == name) {
            Ok(true)
        } else {
            Err(Error::UnknownStorage {
                name: name.to_string(),
            })
        }
    }

    fn report_operation_result(&self, _storage: &str, _weight: OperationWeight, _success: bool) {}

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
