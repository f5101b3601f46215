//! Inter-process status cache tier
//!
//! A JSON file shared by every process using the same storages. Reads take a
//! shared lock, writes take an exclusive lock and rewrite the whole file.

use super::lock::lock_file;
use super::status::StorageStatuses;
use crate::error::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const READ_WRITE_FILE_NAME: &str = ".multistorage_status_cache_rw";
const READ_ONLY_FILE_NAME: &str = ".multistorage_status_cache_ro";

/// Default cache file path for read-write or read-only usage
///
/// Lives in the home directory, or in the temp directory when home is unknown.
pub fn default_file_path(read_write: bool) -> PathBuf {
    let dir = home::home_dir().unwrap_or_else(std::env::temp_dir);
    dir.join(if read_write {
        READ_WRITE_FILE_NAME
    } else {
        READ_ONLY_FILE_NAME
    })
}

fn parse(content: &str) -> Result<StorageStatuses> {
    if content.trim().is_empty() {
        return Ok(StorageStatuses::new());
    }
    Ok(serde_json::from_str(content)?)
}

/// Shared status cache file
#[derive(Debug)]
pub struct SharedFile {
    path: PathBuf,
    /// When this process last wrote the file
    updated: Mutex<Option<DateTime<Utc>>>,
}

impl SharedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            updated: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time of the last write made by this process
    pub fn updated(&self) -> Option<DateTime<Utc>> {
        *self.updated.lock()
    }

    /// Check if this process wrote the file less than `timeout` ago
    pub fn flushed_within(&self, timeout: Duration) -> bool {
        written_within(self.updated(), timeout)
    }

    /// Reserve the next implicit write unless one happened within `timeout`
    ///
    /// Stamps the write time up front, so concurrent callers reserve at most
    /// one write per timeout.
    pub fn claim_flush(&self, timeout: Duration) -> bool {
        let mut updated = self.updated.lock();
        if written_within(*updated, timeout) {
            return false;
        }
        *updated = Some(Utc::now());
        true
    }

    /// Read the statuses; a missing file reads as empty
    pub fn read(&self) -> Result<StorageStatuses> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(StorageStatuses::new()),
            Err(err) => return Err(err.into()),
        };
        let _lock = lock_file(&file, false)?;
        let mut content = String::new();
        (&file).read_to_string(&mut content)?;
        parse(&content)
    }

    /// Replace the file content with `statuses`
    pub fn write(&self, statuses: &StorageStatuses) -> Result<()> {
        let file = self.open_for_write()?;
        let _lock = lock_file(&file, true)?;
        Self::rewrite(&file, statuses)?;
        self.mark_updated();
        Ok(())
    }

    /// Merge `statuses` into the file content under one exclusive lock
    ///
    /// A malformed file is overwritten. Returns the merged statuses.
    pub fn merge_and_write(&self, statuses: &StorageStatuses) -> Result<StorageStatuses> {
        let file = self.open_for_write()?;
        let _lock = lock_file(&file, true)?;

        let mut content = String::new();
        (&file).read_to_string(&mut content)?;
        let on_disk = parse(&content).unwrap_or_else(|err| {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "Overwriting malformed status cache file"
            );
            StorageStatuses::new()
        });

        let merged = StorageStatuses::merge_by_relevance(statuses, &on_disk);
        Self::rewrite(&file, &merged)?;
        self.mark_updated();
        Ok(merged)
    }

    fn open_for_write(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?)
    }

    fn rewrite(mut file: &File, statuses: &StorageStatuses) -> Result<()> {
        let content = serde_json::to_vec(statuses)?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&content)?;
        file.flush()?;
        Ok(())
    }

    fn mark_updated(&self) {
        *self.updated.lock() = Some(Utc::now());
    }
}

fn written_within(updated: Option<DateTime<Utc>>, timeout: Duration) -> bool {
    match updated {
        Some(updated) => match Utc::now().signed_duration_since(updated).to_std() {
            Ok(elapsed) => elapsed < timeout,
            Err(_) => true,
        },
        None => false,
    }
}
