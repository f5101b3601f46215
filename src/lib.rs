//! Multi-Storage - Policy-Driven Object Storage Failover
//!
//! Presents several object storages (a primary and named failovers) as one
//! folder, routing every operation by policy and tracking storage aliveness
//! with a shared exponential-moving-average cache.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                            Multi-Storage Folder                              │
//! │        exists / read / list / put / delete / copy, dispatched by policy      │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │    Collector    │  │     Prober      │  │      Named Registry         │  │
//! │  │ (cache first,   │──│ (read / write   │  │  default, failover_1, ...   │  │
//! │  │  escalating)    │  │  checks, timed) │  │  Key = name#config_hash     │  │
//! │  └────────┬────────┘  └─────────────────┘  └─────────────────────────────┘  │
//! │           │                                                                  │
//! │  ┌────────┴──────────────────────────────────────────────────────────────┐  │
//! │  │                    Aliveness Cache (EMA statuses)                      │  │
//! │  │    process memory tier (mutex)  ◄──merge──►  shared file tier (flock)  │  │
//! │  └───────────────────────────────────────────────────────────────────────┘  │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │                          Storage Backends                                    │
//! │  ┌─────────────────────────────┐  ┌─────────────────────────────────────┐   │
//! │  │          Memory             │  │            Local Fs                 │   │
//! │  └─────────────────────────────┘  └─────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`multistorage`]: policy-driven folder, storage registry and wiring
//! - [`stats`]: aliveness cache, prober, collector and metrics
//! - [`backends`]: memory and local filesystem storages
//! - [`domain`]: folder and storage ports, path helpers
//! - [`config`]: YAML application configuration
//! - [`error`]: Error types and handling

pub mod backends;
pub mod config;
pub mod domain;
pub mod error;
pub mod multistorage;
pub mod stats;

// Re-export commonly used types
pub use backends::{BackendConfig, BackendFactory, FsStorage, MemoryStorage};

pub use config::AppConfig;

pub use domain::ports::{
    Folder, FolderListing, FolderRef, Object, ObjectReader, Storage, StorageRef, ALL_STORAGES,
    DEFAULT_STORAGE,
};

pub use error::{Error, ErrorClass, Result};

pub use multistorage::{
    list_folder_recursively, list_folder_recursively_with_filter,
    list_folder_recursively_with_prefix, MultiFolder, MultiStorage, MultiStorageConfig,
    Policies, PolicyPreset,
};

pub use stats::{
    AliveMap, AlivenessCollector, CacheConfig, Collector, CollectorRef, Key, NopCollector,
    OperationWeight, SharedMemories, StatsMetrics,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
