//! String-keyed local storage shared by the session and the recent-search list.
//!
//! `FileStore` keeps one JSON object on disk and rewrites it on every mutation.
//! There is no cross-process locking: two clients on the same state dir simply
//! overwrite each other (last write wins).

use std::{
  collections::BTreeMap,
  fs,
  path::{Path, PathBuf},
  sync::Mutex,
};

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("storage io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("storage encode error: {0}")]
  Json(#[from] serde_json::Error),
}

pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> Option<String>;
  fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
  fn remove(&self, key: &str) -> Result<(), StorageError>;
}

pub struct FileStore {
  path: PathBuf,
  entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
  /// Open `<dir>/storage.json`, creating `dir` if needed. Unreadable content starts empty.
  pub fn open(dir: &Path) -> Result<Self, StorageError> {
    fs::create_dir_all(dir)?;
    let path = dir.join("storage.json");
    let entries = match fs::read_to_string(&path) {
      Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
        warn!(target: "storage", path = %path.display(), error = %e, "Corrupt storage file; starting empty");
        BTreeMap::new()
      }),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
      Err(e) => return Err(e.into()),
    };
    debug!(target: "storage", path = %path.display(), "Opened local storage");
    Ok(Self { path, entries: Mutex::new(entries) })
  }

  fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
    let body = serde_json::to_string_pretty(entries)?;
    fs::write(&self.path, body)?;
    Ok(())
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Option<String> {
    let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
    entries.get(key).cloned()
  }

  // Mutations are written to disk first; the in-memory map only changes once the write succeeded.
  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
    let mut next = entries.clone();
    next.insert(key.to_string(), value.to_string());
    self.flush(&next)?;
    *entries = next;
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
    if !entries.contains_key(key) {
      return Ok(());
    }
    let mut next = entries.clone();
    next.remove(key);
    self.flush(&next)?;
    *entries = next;
    Ok(())
  }
}

/// Non-persistent store.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<BTreeMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Option<String> {
    self.entries.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    self.entries
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StorageError> {
    self.entries.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
    Ok(())
  }
}
