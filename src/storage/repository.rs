//! On-disk repository layout.
//!
//! ```text
//! <root>/config
//! <root>/<kind>/<name>
//! ```
//!
//! Items are written once. A write goes to a fresh file opened with
//! `create_new`, so an existing item is never overwritten.
//!
//! With a size limit set, the bytes held by items are tracked in memory
//! (seeded by [`Repository::init`]) and a write that would push the total
//! past the limit is refused before anything touches the disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use axum::body::Bytes;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::storage::error::StorageError;
use crate::storage::is_valid_name;

const CONFIG_FILE: &str = "config";

/// Kind whose items stay deletable in append-only mode.
pub const LOCKS: &str = "locks";

/// One listed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub size: u64,
}

#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    append_only: bool,
    max_size: Option<u64>,
    /// Bytes held by items.
    used: AtomicU64,
}

impl Repository {
    pub fn new(root: impl Into<PathBuf>, append_only: bool) -> Self {
        Self {
            root: root.into(),
            append_only,
            max_size: None,
            used: AtomicU64::new(0),
        }
    }

    /// Limit the total size of stored items to `max_size` bytes.
    pub fn with_max_size(mut self, max_size: Option<u64>) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_append_only(&self) -> bool {
        self.append_only
    }

    pub fn max_size(&self) -> Option<u64> {
        self.max_size
    }

    /// Bytes currently held by items.
    pub fn used(&self) -> u64 {
        self.used.load(Ordering::SeqCst)
    }

    /// Create the root and one directory per resource kind, then count the
    /// bytes already stored.
    pub async fn init(&self, kinds: &[String]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await?;
        let mut used = 0u64;
        for kind in kinds {
            fs::create_dir_all(self.root.join(kind)).await?;
            used += self.list(kind).await?.iter().map(|entry| entry.size).sum::<u64>();
        }
        self.used.store(used, Ordering::SeqCst);
        tracing::info!(
            root = %self.root.display(),
            kinds = kinds.len(),
            append_only = self.append_only,
            used,
            max_size = ?self.max_size,
            "Repository ready"
        );
        Ok(())
    }

    pub async fn config_size(&self) -> Result<u64, StorageError> {
        file_size(&self.root.join(CONFIG_FILE), CONFIG_FILE).await
    }

    pub async fn read_config(&self) -> Result<Vec<u8>, StorageError> {
        read_file(&self.root.join(CONFIG_FILE), CONFIG_FILE).await
    }

    /// Store the repository config. Append-only repositories accept it once.
    pub async fn write_config(&self, body: Bytes) -> Result<(), StorageError> {
        let path = self.root.join(CONFIG_FILE);
        if self.append_only {
            return write_new(&path, CONFIG_FILE, &body).await.map_err(|e| match e {
                StorageError::AlreadyExists(_) => StorageError::AppendOnly,
                other => other,
            });
        }
        fs::write(&path, &body).await?;
        Ok(())
    }

    /// All items of `kind`, sorted by name. Hidden files are skipped.
    pub async fn list(&self, kind: &str) -> Result<Vec<Entry>, StorageError> {
        let mut dir = match fs::read_dir(self.root.join(kind)).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(kind.to_owned()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            entries.push(Entry {
                name,
                size: metadata.len(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    pub async fn size(&self, kind: &str, name: &str) -> Result<u64, StorageError> {
        let path = self.item_path(kind, name)?;
        file_size(&path, name).await
    }

    pub async fn read(&self, kind: &str, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.item_path(kind, name)?;
        read_file(&path, name).await
    }

    /// Store a new item. Existing items are never replaced.
    pub async fn create(&self, kind: &str, name: &str, body: Bytes) -> Result<(), StorageError> {
        let path = self.item_path(kind, name)?;
        let len = body.len() as u64;
        self.reserve(len)?;
        if let Err(e) = write_new(&path, name, &body).await {
            self.release(len);
            return Err(e);
        }
        tracing::debug!(kind, name, bytes = len, "Item stored");
        Ok(())
    }

    pub async fn remove(&self, kind: &str, name: &str) -> Result<(), StorageError> {
        if self.append_only && kind != LOCKS {
            return Err(StorageError::AppendOnly);
        }
        let path = self.item_path(kind, name)?;
        let len = file_size(&path, name).await?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                self.release(len);
                tracing::debug!(kind, name, bytes = len, "Item removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    /// Account for `len` new bytes, refusing them past the size limit.
    fn reserve(&self, len: u64) -> Result<(), StorageError> {
        let max = self.max_size.unwrap_or(u64::MAX);
        self.used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                used.checked_add(len).filter(|next| *next <= max)
            })
            .map(|_| ())
            .map_err(|used| {
                tracing::warn!(used, requested = len, max, "Repository size limit reached");
                StorageError::QuotaExceeded(max)
            })
    }

    fn release(&self, len: u64) {
        // files removed behind our back can make the count drift low
        let _ = self
            .used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| Some(used.saturating_sub(len)));
    }

    fn item_path(&self, kind: &str, name: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_name(name) {
            return Err(StorageError::InvalidName(name.to_owned()));
        }
        Ok(self.root.join(kind).join(name))
    }
}

async fn file_size(path: &Path, name: &str) -> Result<u64, StorageError> {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => Ok(metadata.len()),
        Ok(_) => Err(StorageError::NotFound(name.to_owned())),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.to_owned())),
        Err(e) => Err(e.into()),
    }
}

async fn read_file(path: &Path, name: &str) -> Result<Vec<u8>, StorageError> {
    match fs::read(path).await {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.to_owned())),
        Err(e) => Err(e.into()),
    }
}

async fn write_new(path: &Path, name: &str, body: &[u8]) -> Result<(), StorageError> {
    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(StorageError::AlreadyExists(name.to_owned()))
        }
        Err(e) => return Err(e.into()),
    };

    let written = async {
        file.write_all(body).await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = written {
        // leave no partial item behind
        let _ = fs::remove_file(path).await;
        return Err(e.into());
    }
    Ok(())
}
