//! Flat key/value object stores backing the remote artifact store.
//!
//! Keys are `/`-separated. Listing is shallow: `list("a/b/")` returns the
//! keys directly under `a/b/`, never keys of nested prefixes.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;

use super::StorageError;
use super::http::HttpObjectStore;

/// Minimal bucket interface.
#[async_trait]
pub trait ObjectStore: Send + Sync + fmt::Debug {
  /// Where the bucket lives, for logs and messages.
  fn location(&self) -> String;

  /// Fetch an object, `Ok(None)` when the key does not exist.
  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

  /// Create or replace an object.
  async fn put(&self, key: &str, content: &[u8]) -> Result<(), StorageError>;

  async fn exists(&self, key: &str) -> Result<bool, StorageError>;

  /// Keys directly under a `/`-terminated prefix, full key form.
  async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Keep only keys directly under `prefix`.
pub(crate) fn shallow_children(prefix: &str, keys: impl IntoIterator<Item = String>) -> Vec<String> {
  keys
    .into_iter()
    .filter(|key| {
      key
        .strip_prefix(prefix)
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
    })
    .collect()
}

/// Open the object store named by a remote location.
///
/// - `http://…` / `https://…` → [`HttpObjectStore`]
/// - `memory://` → a fresh [`MemoryObjectStore`]
/// - `file://…` or a plain path → [`DirObjectStore`]
pub fn open_object_store(
  location: &str,
  token: Option<&str>,
  timeout: Duration,
) -> Result<Arc<dyn ObjectStore>, StorageError> {
  if location.starts_with("http://") || location.starts_with("https://") {
    return Ok(Arc::new(HttpObjectStore::new(location, token, timeout)?));
  }
  if location == "memory://" {
    return Ok(Arc::new(MemoryObjectStore::new()));
  }
  let path = match location.strip_prefix("file://") {
    Some(path) => path,
    None if location.contains("://") => return Err(StorageError::InvalidLocation(location.to_string())),
    None => location,
  };
  if path.is_empty() {
    return Err(StorageError::InvalidLocation(location.to_string()));
  }
  Ok(Arc::new(DirObjectStore::new(path)))
}

/// In-memory bucket.
///
/// Supports injecting failures for individual keys so that callers' partial
/// failure handling can be exercised.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
  objects: RwLock<BTreeMap<String, Vec<u8>>>,
  failing: Mutex<HashSet<String>>,
}

impl MemoryObjectStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Make every operation touching `key` (or listing `key` as a prefix) fail.
  pub fn inject_failure(&self, key: impl Into<String>) {
    self.failing.lock().unwrap_or_else(|e| e.into_inner()).insert(key.into());
  }

  pub fn len(&self) -> usize {
    self.objects.read().unwrap_or_else(|e| e.into_inner()).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn check(&self, operation: &'static str, key: &str) -> Result<(), StorageError> {
    if self.failing.lock().unwrap_or_else(|e| e.into_inner()).contains(key) {
      return Err(StorageError::remote(operation, key, "injected failure"));
    }
    Ok(())
  }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
  fn location(&self) -> String {
    "memory://".to_string()
  }

  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
    self.check("get", key)?;
    Ok(self.objects.read().unwrap_or_else(|e| e.into_inner()).get(key).cloned())
  }

  async fn put(&self, key: &str, content: &[u8]) -> Result<(), StorageError> {
    self.check("put", key)?;
    self
      .objects
      .write()
      .unwrap_or_else(|e| e.into_inner())
      .insert(key.to_string(), content.to_vec());
    Ok(())
  }

  async fn exists(&self, key: &str) -> Result<bool, StorageError> {
    self.check("head", key)?;
    Ok(self.objects.read().unwrap_or_else(|e| e.into_inner()).contains_key(key))
  }

  async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
    self.check("list", prefix)?;
    let objects = self.objects.read().unwrap_or_else(|e| e.into_inner());
    Ok(shallow_children(prefix, objects.keys().cloned()))
  }
}

/// Bucket backed by a directory (for example a shared network mount).
#[derive(Debug, Clone)]
pub struct DirObjectStore {
  root: PathBuf,
}

impl DirObjectStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn path(&self, key: &str) -> PathBuf {
    key.split('/').filter(|s| !s.is_empty()).fold(self.root.clone(), |p, s| p.join(s))
  }
}

#[async_trait]
impl ObjectStore for DirObjectStore {
  fn location(&self) -> String {
    format!("file://{}", self.root.display())
  }

  async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
    let path = self.path(key);
    match fs::read(&path).await {
      Ok(content) => Ok(Some(content)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(StorageError::io(path, e)),
    }
  }

  async fn put(&self, key: &str, content: &[u8]) -> Result<(), StorageError> {
    let path = self.path(key);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await.map_err(|e| StorageError::io(parent, e))?;
    }
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)
      .await
      .map_err(|e| StorageError::io(&temp_path, e))?;
    fs::rename(&temp_path, &path).await.map_err(|e| StorageError::io(&path, e))
  }

  async fn exists(&self, key: &str) -> Result<bool, StorageError> {
    let path = self.path(key);
    fs::try_exists(&path).await.map_err(|e| StorageError::io(path, e))
  }

  async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
    let dir = self.path(prefix);
    let mut keys = Vec::new();

    let mut entries = match fs::read_dir(&dir).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(keys),
      Err(e) => return Err(StorageError::io(dir, e)),
    };

    while let Some(entry) = entries.next_entry().await.map_err(|e| StorageError::io(&dir, e))? {
      let is_file = entry
        .file_type()
        .await
        .map_err(|e| StorageError::io(entry.path(), e))?
        .is_file();
      if is_file {
        keys.push(format!("{}{}", prefix, entry.file_name().to_string_lossy()));
      }
    }

    keys.sort();
    Ok(keys)
  }
}
