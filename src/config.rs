//! Application configuration loaded from YAML
//!
//! ```yaml
//! primary:
//!   type: fs
//!   root: /var/backups/primary
//! failovers:
//!   failover_1:
//!     type: fs
//!     root: /mnt/replica/backups
//! multistorage:
//!   alive_check_timeout: 30s
//!   policies: unite_all
//!   status_cache:
//!     ttl: 5m
//! ```

use crate::backends::{BackendConfig, BackendFactory};
use crate::error::{Error, Result};
use crate::multistorage::{MultiStorage, MultiStorageConfig};
use crate::stats::SharedMemories;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Storages and multi-storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub primary: BackendConfig,
    #[serde(default)]
    pub failovers: BTreeMap<String, BackendConfig>,
    #[serde(default)]
    pub multistorage: MultiStorageConfig,
}

impl AppConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let yaml = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&yaml)
    }

    fn validate(&self) -> Result<()> {
        for name in self.failovers.keys() {
            if name.is_empty() || name == crate::domain::DEFAULT_STORAGE || name.contains('#') {
                return Err(Error::Configuration(format!(
                    "invalid failover storage name {name:?}"
                )));
            }
        }
        Ok(())
    }

    /// Create every backend and wire them into a multi-storage
    pub async fn open(&self, memories: &SharedMemories) -> Result<MultiStorage> {
        let primary = BackendFactory::create(&self.primary).await?;
        let mut failovers = HashMap::with_capacity(self.failovers.len());
        for (name, backend) in &self.failovers {
            failovers.insert(name.clone(), BackendFactory::create(backend).await?);
        }
        MultiStorage::new(self.multistorage.clone(), primary, failovers, memories)
    }
}
