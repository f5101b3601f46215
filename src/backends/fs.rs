//! Local Filesystem Storage Backend
//!
//! Stores objects as plain files below a root directory.

use crate::domain::path::sub_folder_path;
use crate::domain::ports::{Folder, FolderListing, FolderRef, Object, ObjectReader, Storage};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

fn map_io(err: std::io::Error, path: &Path) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::not_found(path.display().to_string())
    } else {
        Error::Io(err)
    }
}

// =============================================================================
// Filesystem Storage
// =============================================================================

/// Object storage rooted at a local directory
#[derive(Debug, Clone)]
pub struct FsStorage {
    root_path: PathBuf,
}

impl FsStorage {
    /// Open (and create if missing) a storage rooted at `root_path`
    pub async fn open(root_path: impl Into<PathBuf>) -> Result<Self> {
        let root_path = root_path.into();
        fs::create_dir_all(&root_path).await?;
        Ok(Self { root_path })
    }

    /// Root directory
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }
}

#[async_trait]
impl Storage for FsStorage {
    fn root_folder(&self) -> FolderRef {
        Arc::new(FsFolder {
            root_path: self.root_path.clone(),
            path: String::new(),
        })
    }

    fn config_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(b"fs:");
        hasher.update(self.root_path.to_string_lossy().as_bytes());
        hex::encode(hasher.finalize())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

// =============================================================================
// Filesystem Folder
// =============================================================================

/// Directory below an [`FsStorage`] root
#[derive(Debug, Clone)]
pub struct FsFolder {
    root_path: PathBuf,
    path: String,
}

impl FsFolder {
    fn dir_path(&self) -> PathBuf {
        self.root_path.join(&self.path)
    }

    fn file_path(&self, object_path: &str) -> PathBuf {
        self.dir_path().join(object_path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Folder for FsFolder {
    fn path(&self) -> &str {
        &self.path
    }

    fn sub_folder(&self, relative_path: &str) -> FolderRef {
        Arc::new(FsFolder {
            root_path: self.root_path.clone(),
            path: sub_folder_path(&self.path, relative_path),
        })
    }

    async fn exists(&self, object_path: &str) -> Result<bool> {
        let path = self.file_path(object_path);
        match fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(Error::Io(err)),
        }
    }

    async fn read_object(&self, object_path: &str) -> Result<ObjectReader> {
        let path = self.file_path(object_path);
        let file = fs::File::open(&path).await.map_err(|e| map_io(e, &path))?;
        Ok(Box::new(file))
    }

    async fn list_folder(&self) -> Result<FolderListing> {
        let dir = self.dir_path();
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok((Vec::new(), Vec::new())),
            Err(err) => return Err(map_io(err, &dir)),
        };

        let mut objects = Vec::new();
        let mut folders = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let meta = entry.metadata().await?;
            if meta.is_dir() {
                folders.push((name.clone(), self.sub_folder(&name)));
            } else {
                let modified = meta
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                objects.push(Object::new(name, meta.len(), modified));
            }
        }
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        folders.sort_by(|a, b| a.0.cmp(&b.0));

        Ok((objects, folders.into_iter().map(|(_, f)| f).collect()))
    }

    async fn put_object(&self, name: &str, content: Bytes) -> Result<()> {
        let path = self.file_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, &content).await?;
        Ok(())
    }

    async fn delete_objects(&self, object_paths: &[String]) -> Result<()> {
        for object_path in object_paths {
            match fs::remove_file(self.file_path(object_path)).await {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(Error::Io(err)),
            }
        }
        Ok(())
    }

    async fn copy_object(&self, src_path: &str, dst_path: &str) -> Result<()> {
        let src = self.file_path(src_path);
        let dst = self.file_path(dst_path);
        if !self.exists(src_path).await? {
            return Err(Error::not_found(src.display().to_string()));
        }
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&src, &dst).await.map_err(|e| map_io(e, &src))?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
