//! Policy-driven multi-storage folder

use super::named::NamedFolder;
use super::policies::{
    CopyPolicy, DeletePolicy, ExistsPolicy, ListPolicy, Policies, PutPolicy, ReadPolicy,
};
use super::report::ReportReader;
use crate::domain::path::{base_name, sub_folder_path, trim_root};
use crate::domain::ports::{
    Folder, FolderListing, FolderRef, Object, ObjectReader, ALL_STORAGES,
};
use crate::error::{Error, Result};
use crate::stats::{CollectorRef, OperationWeight};
use async_trait::async_trait;
use bytes::Bytes;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Objects and multi-storage sub-folders of a listing
pub type MultiListing = (Vec<Object>, Vec<MultiFolder>);

/// Folder aggregating the same path across several storages
///
/// Cloning is cheap; every `use_*` / `with_policies` call returns a new
/// folder and leaves the original untouched.
#[derive(Clone)]
pub struct MultiFolder {
    collector: CollectorRef,
    configured_roots: Arc<HashMap<String, FolderRef>>,
    used: Vec<NamedFolder>,
    path: String,
    policies: Policies,
}

impl MultiFolder {
    /// Root folder over `roots`, using no storages until one of the `use_*`
    /// methods is called
    pub fn new(roots: HashMap<String, FolderRef>, collector: CollectorRef) -> Self {
        Self {
            collector,
            configured_roots: Arc::new(roots),
            used: Vec::new(),
            path: String::new(),
            policies: Policies::default(),
        }
    }

    // =========================================================================
    // Storage Selection
    // =========================================================================

    pub fn policies(&self) -> Policies {
        self.policies
    }

    pub fn with_policies(&self, policies: Policies) -> Self {
        Self {
            policies,
            ..self.clone()
        }
    }

    /// Names of the used storages in priority order
    pub fn used_storages(&self) -> Vec<String> {
        self.used.iter().map(|f| f.storage_name.clone()).collect()
    }

    pub fn ensure_single_storage_is_used(&self) -> Result<()> {
        match self.used.len() {
            1 => Ok(()),
            count => Err(Error::MultipleStoragesUsed { count }),
        }
    }

    /// Use every storage the collector considers alive
    pub async fn use_all_alive_storages(&self) -> Result<Self> {
        let alive = self.collector.all_alive_storages().await?;
        if alive.is_empty() {
            return Err(Error::NoAliveStorages);
        }
        debug!(path = %self.path, storages = ?alive, "Using all alive storages");
        self.using(alive)
    }

    /// Use the first alive storage in priority order
    pub async fn use_first_alive_storage(&self) -> Result<Self> {
        let first = self
            .collector
            .first_alive_storage()
            .await?
            .ok_or(Error::NoAliveStorages)?;
        debug!(path = %self.path, storage = %first, "Using first alive storage");
        self.using([first])
    }

    /// Use the named storage, which must be alive
    pub async fn use_specific_storage(&self, name: &str) -> Result<Self> {
        if self.used.len() == 1 && self.used[0].storage_name == name {
            return Ok(self.clone());
        }

        if !self.collector.specific_storage(name).await? {
            return Err(Error::NoAliveStorages);
        }
        debug!(path = %self.path, storage = %name, "Using specific storage");
        self.using([name.to_string()])
    }

    fn using(&self, names: impl IntoIterator<Item = String>) -> Result<Self> {
        let used = names
            .into_iter()
            .map(|name| -> Result<NamedFolder> {
                let root = self
                    .configured_roots
                    .get(&name)
                    .ok_or_else(|| Error::UnknownStorage { name: name.clone() })?;
                Ok(NamedFolder::new(name, root.sub_folder(&self.path)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            used,
            ..self.clone()
        })
    }

    /// Multi-storage folder at `relative_path` below this one
    pub fn multi_sub_folder(&self, relative_path: &str) -> Self {
        Self {
            used: self
                .used
                .iter()
                .map(|f| f.sub_folder(relative_path))
                .collect(),
            path: sub_folder_path(&self.path, relative_path),
            ..self.clone()
        }
    }

    /// Check that at least one used storage is reachable
    pub async fn validate(&self) -> Result<()> {
        if self.used.is_empty() {
            return Err(Error::NoUsedStorages);
        }

        let mut failed = 0;
        for folder in &self.used {
            if let Err(err) = folder.folder.list_folder().await {
                warn!(
                    storage = %folder.storage_name,
                    path = %self.path,
                    error = %err,
                    "Storage folder failed validation"
                );
                failed += 1;
            }
        }
        if failed == self.used.len() {
            return Err(Error::NoAliveStorages);
        }
        Ok(())
    }

    fn first_used(&self) -> Result<&NamedFolder> {
        self.used.first().ok_or(Error::NoUsedStorages)
    }

    fn all_used(&self) -> Result<&[NamedFolder]> {
        if self.used.is_empty() {
            return Err(Error::NoUsedStorages);
        }
        Ok(&self.used)
    }

    fn report(&self, storage: &str, weight: OperationWeight, success: bool) {
        self.collector
            .report_operation_result(storage, weight, success);
    }

    async fn checked_exists(&self, folder: &NamedFolder, object_path: &str) -> Result<bool> {
        let result = folder.folder.exists(object_path).await;
        self.report(&folder.storage_name, OperationWeight::EXISTS, result.is_ok());
        result.map_err(|err| err.in_storage(&folder.storage_name, "check object for existence"))
    }

    // =========================================================================
    // Exists
    // =========================================================================

    /// Check existence under the exists policy, also returning the storage
    /// that decided the answer
    pub async fn exists_with_storage(&self, object_path: &str) -> Result<(bool, String)> {
        match self.policies.exists {
            ExistsPolicy::First => self.exists_in_first(object_path).await,
            ExistsPolicy::Any => self.exists_in_any(object_path).await,
            ExistsPolicy::All => self.exists_in_all(object_path).await,
        }
    }

    pub async fn exists_in_first(&self, object_path: &str) -> Result<(bool, String)> {
        let first = self.first_used()?;
        let found = self.checked_exists(first, object_path).await?;
        Ok((found, first.storage_name.clone()))
    }

    /// Storage name is [`ALL_STORAGES`] when no storage has the object
    pub async fn exists_in_any(&self, object_path: &str) -> Result<(bool, String)> {
        for folder in self.all_used()? {
            if self.checked_exists(folder, object_path).await? {
                return Ok((true, folder.storage_name.clone()));
            }
        }
        Ok((false, ALL_STORAGES.to_string()))
    }

    /// Storage name is [`ALL_STORAGES`] when every storage has the object
    pub async fn exists_in_all(&self, object_path: &str) -> Result<(bool, String)> {
        for folder in self.all_used()? {
            if !self.checked_exists(folder, object_path).await? {
                return Ok((false, folder.storage_name.clone()));
            }
        }
        Ok((true, ALL_STORAGES.to_string()))
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Open an object under the read policy, also returning its storage
    pub async fn read_object_with_storage(
        &self,
        object_path: &str,
    ) -> Result<(ObjectReader, String)> {
        match self.policies.read {
            ReadPolicy::First => self.read_object_from_first(object_path).await,
            ReadPolicy::FoundFirst => self.read_object_found_first(object_path).await,
        }
    }

    pub async fn read_object_from_first(
        &self,
        object_path: &str,
    ) -> Result<(ObjectReader, String)> {
        let first = self.first_used()?;
        self.read_from(first, object_path).await
    }

    pub async fn read_object_found_first(
        &self,
        object_path: &str,
    ) -> Result<(ObjectReader, String)> {
        for folder in self.all_used()? {
            if self.checked_exists(folder, object_path).await? {
                return self.read_from(folder, object_path).await;
            }
        }
        Err(Error::ObjectNotFound {
            path: object_path.to_string(),
            storage: Some(ALL_STORAGES.to_string()),
        })
    }

    async fn read_from(
        &self,
        folder: &NamedFolder,
        object_path: &str,
    ) -> Result<(ObjectReader, String)> {
        match folder.folder.read_object(object_path).await {
            Ok(reader) => {
                let reader = ReportReader::new(
                    reader,
                    Arc::clone(&self.collector),
                    folder.storage_name.clone(),
                );
                Ok((Box::new(reader), folder.storage_name.clone()))
            }
            Err(err) if err.is_not_found() => {
                self.report(&folder.storage_name, OperationWeight::read(0), true);
                Err(err)
            }
            Err(err) => {
                self.report(&folder.storage_name, OperationWeight::read(0), false);
                Err(err.in_storage(&folder.storage_name, "read object"))
            }
        }
    }

    // =========================================================================
    // List
    // =========================================================================

    /// List under the list policy
    pub async fn list_multi_folder(&self) -> Result<MultiListing> {
        match self.policies.list {
            ListPolicy::First => self.list_folder_in_first().await,
            ListPolicy::FoundFirst => self.list_folder_where_found_first().await,
            ListPolicy::All => self.list_folder_all().await,
        }
    }

    pub async fn list_folder_in_first(&self) -> Result<MultiListing> {
        let first = self.first_used()?;
        self.list_specific_folder(first).await
    }

    /// Each object name once, from the highest-priority storage having it
    pub async fn list_folder_where_found_first(&self) -> Result<MultiListing> {
        let mut objects: IndexMap<String, Object> = IndexMap::new();
        let mut sub_folders: IndexMap<String, MultiFolder> = IndexMap::new();

        for folder in self.all_used()? {
            let (found_objects, found_folders) = self.list_specific_folder(folder).await?;
            for object in found_objects {
                objects.entry(object.name.clone()).or_insert(object);
            }
            for sub in found_folders {
                sub_folders.entry(sub.path.clone()).or_insert(sub);
            }
        }
        Ok((
            objects.into_values().collect(),
            sub_folders.into_values().collect(),
        ))
    }

    /// Every object of every storage, sub-folders once per path
    pub async fn list_folder_all(&self) -> Result<MultiListing> {
        let mut objects = Vec::new();
        let mut seen = IndexSet::new();
        let mut sub_folders = Vec::new();

        for folder in self.all_used()? {
            let (found_objects, found_folders) = self.list_specific_folder(folder).await?;
            objects.extend(found_objects);
            for sub in found_folders {
                if seen.insert(sub.path.clone()) {
                    sub_folders.push(sub);
                }
            }
        }
        Ok((objects, sub_folders))
    }

    async fn list_specific_folder(&self, folder: &NamedFolder) -> Result<MultiListing> {
        let result = folder.folder.list_folder().await;
        self.report(&folder.storage_name, OperationWeight::LIST, result.is_ok());
        let (objects, sub_folders) =
            result.map_err(|err| err.in_storage(&folder.storage_name, "list folder"))?;

        let objects = objects
            .into_iter()
            .map(|object| object.with_storage(&folder.storage_name))
            .collect();

        let root_path = self
            .configured_roots
            .get(&folder.storage_name)
            .map(|root| root.path().to_string())
            .unwrap_or_default();
        let sub_folders = sub_folders
            .iter()
            .map(|sub| {
                let name = base_name(sub.path());
                Self {
                    used: self.used.iter().map(|f| f.sub_folder(name)).collect(),
                    path: trim_root(sub.path(), &root_path).to_string(),
                    ..self.clone()
                }
            })
            .collect();
        Ok((objects, sub_folders))
    }

    // =========================================================================
    // Put
    // =========================================================================

    async fn put_to(&self, folder: &NamedFolder, name: &str, content: Bytes) -> Result<()> {
        let weight = OperationWeight::put(content.len() as u64);
        let result = folder.folder.put_object(name, content).await;
        self.report(&folder.storage_name, weight, result.is_ok());
        result.map_err(|err| err.in_storage(&folder.storage_name, "put object"))
    }

    pub async fn put_object_to_first(&self, name: &str, content: Bytes) -> Result<()> {
        let first = self.first_used()?;
        self.put_to(first, name, content).await
    }

    /// Update the first storage having the object, else write to the first
    pub async fn put_object_or_update_first_found(&self, name: &str, content: Bytes) -> Result<()> {
        let used = self.all_used()?;
        for folder in used {
            if self.checked_exists(folder, name).await? {
                return self.put_to(folder, name, content).await;
            }
        }
        self.put_to(&used[0], name, content).await
    }

    /// Write to every storage, stopping at the first failure
    pub async fn put_object_to_all(&self, name: &str, content: Bytes) -> Result<()> {
        for folder in self.all_used()? {
            self.put_to(folder, name, content.clone()).await?;
        }
        Ok(())
    }

    /// Update every storage having the object, else write to the first
    pub async fn put_object_or_update_all_found(&self, name: &str, content: Bytes) -> Result<()> {
        let used = self.all_used()?;
        let mut found = Vec::new();
        for folder in used {
            if self.checked_exists(folder, name).await? {
                found.push(folder);
            }
        }

        if found.is_empty() {
            return self.put_to(&used[0], name, content).await;
        }
        for folder in found {
            self.put_to(folder, name, content.clone()).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Delete
    // =========================================================================

    async fn delete_from(&self, folder: &NamedFolder, object_paths: &[String]) -> Result<()> {
        let result = folder.folder.delete_objects(object_paths).await;
        self.report(
            &folder.storage_name,
            OperationWeight::delete(object_paths.len()),
            result.is_ok(),
        );
        result.map_err(|err| err.in_storage(&folder.storage_name, "delete objects"))
    }

    pub async fn delete_objects_from_first(&self, object_paths: &[String]) -> Result<()> {
        let first = self.first_used()?;
        self.delete_from(first, object_paths).await
    }

    pub async fn delete_objects_from_all(&self, object_paths: &[String]) -> Result<()> {
        for folder in self.all_used()? {
            self.delete_from(folder, object_paths).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Copy
    // =========================================================================

    /// A missing source counts as a healthy storage, the error is still returned
    pub async fn copy_object_in_first(&self, src_path: &str, dst_path: &str) -> Result<()> {
        let first = self.first_used()?;
        match first.folder.copy_object(src_path, dst_path).await {
            Ok(()) => {
                self.report(&first.storage_name, OperationWeight::COPY, true);
                Ok(())
            }
            Err(err) => {
                self.report(&first.storage_name, OperationWeight::COPY, err.is_not_found());
                Err(err.in_storage(&first.storage_name, "copy object"))
            }
        }
    }

    /// Copy wherever the source exists; fails only if no storage had it
    pub async fn copy_object_in_all(&self, src_path: &str, dst_path: &str) -> Result<()> {
        let mut copied = false;
        for folder in self.all_used()? {
            match folder.folder.copy_object(src_path, dst_path).await {
                Ok(()) => {
                    self.report(&folder.storage_name, OperationWeight::COPY, true);
                    copied = true;
                }
                Err(err) if err.is_not_found() => {
                    self.report(&folder.storage_name, OperationWeight::COPY, true);
                }
                Err(err) => {
                    self.report(&folder.storage_name, OperationWeight::COPY, false);
                    return Err(err.in_storage(&folder.storage_name, "copy object"));
                }
            }
        }

        if !copied {
            return Err(Error::ObjectNotFound {
                path: src_path.to_string(),
                storage: Some(ALL_STORAGES.to_string()),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for MultiFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiFolder")
            .field("path", &self.path)
            .field("used", &self.used_storages())
            .field("policies", &self.policies)
            .finish()
    }
}

#[async_trait]
impl Folder for MultiFolder {
    fn path(&self) -> &str {
        &self.path
    }

    fn sub_folder(&self, relative_path: &str) -> FolderRef {
        Arc::new(self.multi_sub_folder(relative_path))
    }

    async fn exists(&self, object_path: &str) -> Result<bool> {
        self.exists_with_storage(object_path)
            .await
            .map(|(found, _)| found)
    }

    async fn read_object(&self, object_path: &str) -> Result<ObjectReader> {
        self.read_object_with_storage(object_path)
            .await
            .map(|(reader, _)| reader)
    }

    async fn list_folder(&self) -> Result<FolderListing> {
        let (objects, sub_folders) = self.list_multi_folder().await?;
        Ok((
            objects,
            sub_folders
                .into_iter()
                .map(|sub| Arc::new(sub) as FolderRef)
                .collect(),
        ))
    }

    async fn put_object(&self, name: &str, content: Bytes) -> Result<()> {
        match self.policies.put {
            PutPolicy::First => self.put_object_to_first(name, content).await,
            PutPolicy::UpdateFirstFound => self.put_object_or_update_first_found(name, content).await,
            PutPolicy::All => self.put_object_to_all(name, content).await,
            PutPolicy::UpdateAllFound => self.put_object_or_update_all_found(name, content).await,
        }
    }

    async fn delete_objects(&self, object_paths: &[String]) -> Result<()> {
        match self.policies.delete {
            DeletePolicy::First => self.delete_objects_from_first(object_paths).await,
            DeletePolicy::All => self.delete_objects_from_all(object_paths).await,
        }
    }

    async fn copy_object(&self, src_path: &str, dst_path: &str) -> Result<()> {
        match self.policies.copy {
            CopyPolicy::First => self.copy_object_in_first(src_path, dst_path).await,
            CopyPolicy::All => self.copy_object_in_all(src_path, dst_path).await,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
