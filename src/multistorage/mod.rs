//! Multi-storage facade
//!
//! A [`MultiFolder`] looks like a single [`Folder`](crate::domain::Folder)
//! but dispatches every operation to one, some or all of the storages it
//! currently uses, as selected by its [`Policies`]. The set of used storages
//! is chosen through the collector (`use_all_alive_storages`,
//! `use_first_alive_storage`, `use_specific_storage`).
//!
//! ```text
//!   caller ──► MultiFolder ──► policy ──► storage folders (default, failover_*)
//!                   │                              │
//!                   └──── Collector ◄── reports ───┘
//! ```

pub mod folder;
pub mod list;
pub mod named;
pub mod policies;
pub mod report;
pub mod storage;

pub use folder::{MultiFolder, MultiListing};
pub use list::{
    list_folder_recursively, list_folder_recursively_with_filter,
    list_folder_recursively_with_prefix,
};
pub use named::{NamedFolder, NamedStorage, NamedStorages};
pub use policies::{
    CopyPolicy, DeletePolicy, ExistsPolicy, ListPolicy, Policies, PolicyPreset, PutPolicy,
    ReadPolicy,
};
pub use report::ReportReader;
pub use storage::{MultiStorage, MultiStorageConfig};

#[cfg(test)]
pub(crate) mod test_support {
    use crate::error::{Error, Result};
    use crate::stats::{Collector, OperationWeight};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Collector answering from a fixed alive list and recording reports
    #[derive(Default)]
    pub struct RecordingCollector {
        pub order: Vec<String>,
        pub alive: Mutex<Vec<String>>,
        pub reports: Mutex<Vec<(String, f64, bool)>>,
    }

    impl RecordingCollector {
        pub fn new(order: &[&str], alive: &[&str]) -> Self {
            Self {
                order: order.iter().map(|s| s.to_string()).collect(),
                alive: Mutex::new(alive.iter().map(|s| s.to_string()).collect()),
                reports: Mutex::new(Vec::new()),
            }
        }

        pub fn reports_for(&self, storage: &str) -> Vec<(f64, bool)> {
            self.reports
                .lock()
                .iter()
                .filter(|(s, _, _)| s == storage)
                .map(|(_, w, ok)| (*w, *ok))
                .collect()
        }
    }

    #[async_trait]
    impl Collector for RecordingCollector {
        async fn all_alive_storages(&self) -> Result<Vec<String>> {
            let alive = self.alive.lock();
            Ok(self
                .order
                .iter()
                .filter(|name| alive.contains(name))
                .cloned()
                .collect())
        }

        async fn first_alive_storage(&self) -> Result<Option<String>> {
            Ok(self.all_alive_storages().await?.into_iter().next())
        }

        async fn specific_storage(&self, name: &str) -> Result<bool> {
            if !self.order.iter().any(|n| n == name) {
                return Err(Error::UnknownStorage {
                    name: name.to_string(),
                });
            }
            Ok(self.alive.lock().iter().any(|n| n == name))
        }

        fn report_operation_result(&self, storage: &str, weight: OperationWeight, success: bool) {
            self.reports
                .lock()
                .push((storage.to_string(), weight.value(), success));
        }

        async fn close(&self) -> Result<()> {
            Ok(())
        }
    }
}
