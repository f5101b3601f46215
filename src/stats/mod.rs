//! Storage aliveness statistics
//!
//! - [`cache`]: two-tier EMA aliveness cache
//! - [`checker`]: concurrent probes with a shared timeout
//! - [`collector`]: cache-first storage selection with escalating probes
//! - [`operation`]: weights of passive operation reports
//! - [`metrics`]: Prometheus counters

pub mod cache;
pub mod checker;
pub mod collector;
pub mod metrics;
pub mod operation;

pub use cache::{
    AliveMap, AlivenessCache, CacheConfig, EmaParams, Key, SharedFile, SharedMemories,
    SharedMemory, StatusCache, StatusCacheRef,
};
pub use checker::{AliveChecker, AliveProber, AliveProberRef, ReadCheck, StorageCheck, WriteCheck};
pub use collector::{AlivenessCollector, Collector, CollectorRef, NopCollector, ProbeStage};
pub use metrics::StatsMetrics;
pub use operation::OperationWeight;
