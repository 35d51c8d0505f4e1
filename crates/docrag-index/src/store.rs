//! Durable index storage.
//!
//! Writes go to a uniquely named temporary file next to the target, are synced,
//! and then renamed over it, so a reader sees either the previous index or the
//! new one. Writers to the same location are serialized by [`IndexStore::lock_for_write`].

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::error::IndexError;
use crate::index::VectorIndex;

type LockRegistry = Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>;

static WRITE_LOCKS: LazyLock<LockRegistry> = LazyLock::new(|| Mutex::new(HashMap::new()));

/// Exclusive write access to one index location. Released on drop.
#[derive(Debug)]
pub struct WriteGuard {
    key: PathBuf,
    _guard: OwnedMutexGuard<()>,
}

#[derive(Debug, Clone)]
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for exclusive write access to this store's location.
    ///
    /// Every `IndexStore` in the process pointing at the same path shares the lock.
    pub async fn lock_for_write(&self) -> WriteGuard {
        let key = self.lock_key();
        let lock = {
            let mut locks = WRITE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        WriteGuard {
            key,
            _guard: lock.lock_owned().await,
        }
    }

    fn lock_key(&self) -> PathBuf {
        std::path::absolute(&self.path).unwrap_or_else(|_| self.path.clone())
    }

    /// Replace whatever is stored at this location with `index`, taking the
    /// write lock for the duration of the write.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem step fails. The
    /// previously persisted index is left intact in that case.
    pub async fn persist(&self, index: &VectorIndex) -> Result<(), IndexError> {
        let guard = self.lock_for_write().await;
        self.persist_locked(guard, index).await
    }

    /// Replace the stored index while holding a guard from [`Self::lock_for_write`].
    ///
    /// The guard travels with the blocking write and is released only after
    /// the rename lands, even if the returned future is dropped early.
    ///
    /// # Errors
    ///
    /// Returns an error if `guard` was taken for a different location, or if
    /// serialization or any filesystem step fails.
    pub async fn persist_locked(
        &self,
        guard: WriteGuard,
        index: &VectorIndex,
    ) -> Result<(), IndexError> {
        if guard.key != self.lock_key() {
            return Err(IndexError::Io(io::Error::other(format!(
                "write guard for {} cannot persist to {}",
                guard.key.display(),
                self.path.display()
            ))));
        }

        let data = serde_json::to_vec(index)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let result = atomic_write(&path, &data);
            drop(guard);
            result
        })
        .await
        .map_err(|e| IndexError::Io(io::Error::other(e)))??;

        tracing::info!(
            path = %self.path.display(),
            entries = index.len(),
            "index persisted"
        );
        Ok(())
    }

    /// Read the index persisted at this location.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::IndexNotFound`] if nothing has been persisted and
    /// [`IndexError::IndexCorrupt`] if the stored data is not a valid index.
    pub async fn load(&self) -> Result<VectorIndex, IndexError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IndexError::IndexNotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let index: VectorIndex =
            serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e.to_string()))?;
        index.validate().map_err(|reason| self.corrupt(reason))?;

        tracing::debug!(path = %self.path.display(), entries = index.len(), "index loaded");
        Ok(index)
    }

    fn corrupt(&self, reason: String) -> IndexError {
        IndexError::IndexCorrupt {
            path: self.path.clone(),
            reason,
        }
    }
}

fn temp_path(path: &Path, parent: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("index");
    parent.join(format!(".{file_name}.tmp.{}", Uuid::new_v4()))
}

fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let temp = temp_path(path, parent);
    let result = write_and_rename(&temp, path, data);
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result?;

    fsync_dir(parent)
}

fn write_and_rename(temp: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(temp)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp, path)
}

#[cfg(unix)]
fn fsync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn fsync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
