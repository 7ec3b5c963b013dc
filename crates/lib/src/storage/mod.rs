//! Artifact storage providers.
//!
//! Both the local store and the remote bucket expose the same
//! [`StorageProvider`] capability over `(project, tag | id)`:
//!
//! ```text
//! <root>/<project>/
//! ├── tags/<tag>.json     # mutable alias, same bytes as the id it points to
//! └── ids/<id>.json       # immutable, content-addressed
//! ```
//!
//! The remote store uses the same key scheme under a configurable prefix.
//! No operation is transactional across calls: an observer may briefly see an
//! id without the tag that is about to point at it.

pub mod http;
pub mod local;
pub mod object_store;
pub mod remote;

use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::reference::{ArtifactKey, ReferenceError};
use crate::util::hash::ArtifactId;

pub use http::HttpObjectStore;
pub use local::LocalStorage;
pub use object_store::{DirObjectStore, MemoryObjectStore, ObjectStore, open_object_store};
pub use remote::RemoteStorage;

/// Errors raised by storage providers.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("{key} not found in project '{project}'")]
  NotFound { project: String, key: ArtifactKey },

  #[error(transparent)]
  InvalidName(#[from] ReferenceError),

  #[error("i/o error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("remote {operation} failed for '{key}': {message}")]
  Remote {
    operation: &'static str,
    key: String,
    message: String,
  },

  #[error("invalid remote location '{0}'")]
  InvalidLocation(String),
}

impl StorageError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    StorageError::Io {
      path: path.into(),
      source,
    }
  }

  pub(crate) fn remote(operation: &'static str, key: &str, message: impl ToString) -> Self {
    StorageError::Remote {
      operation,
      key: key.to_string(),
      message: message.to_string(),
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, StorageError::NotFound { .. })
  }
}

/// Operations shared by the local and remote artifact stores.
#[async_trait]
pub trait StorageProvider: Send + Sync {
  /// Human-readable location, used in logs.
  fn location(&self) -> String;

  /// Create whatever structure the project needs. Idempotent.
  async fn ensure_project_setup(&self, project: &str) -> Result<(), StorageError>;

  async fn list_tags(&self, project: &str) -> Result<BTreeSet<String>, StorageError>;

  async fn list_ids(&self, project: &str) -> Result<BTreeSet<ArtifactId>, StorageError>;

  async fn has_by_tag(&self, project: &str, tag: &str) -> Result<bool, StorageError>;

  async fn has_by_id(&self, project: &str, id: &ArtifactId) -> Result<bool, StorageError>;

  /// Store `content` under `id`, and make `tag` resolve to the same content
  /// when given. Existing ids are never rewritten; an existing tag is
  /// repointed.
  async fn upload(
    &self,
    project: &str,
    id: &ArtifactId,
    tag: Option<&str>,
    content: &[u8],
  ) -> Result<(), StorageError>;

  async fn download_by_tag(&self, project: &str, tag: &str) -> Result<Vec<u8>, StorageError>;

  async fn download_by_id(&self, project: &str, id: &ArtifactId) -> Result<Vec<u8>, StorageError>;

  async fn has(&self, project: &str, key: &ArtifactKey) -> Result<bool, StorageError> {
    match key {
      ArtifactKey::Tag(tag) => self.has_by_tag(project, tag).await,
      ArtifactKey::Id(id) => self.has_by_id(project, id).await,
    }
  }

  async fn download(&self, project: &str, key: &ArtifactKey) -> Result<Vec<u8>, StorageError> {
    match key {
      ArtifactKey::Tag(tag) => self.download_by_tag(project, tag).await,
      ArtifactKey::Id(id) => self.download_by_id(project, id).await,
    }
  }

  /// Resolve a tag-or-id selector, checking tags before ids.
  ///
  /// Returns `Ok(None)` when the selector matches neither.
  async fn resolve(&self, project: &str, selector: &str) -> Result<Option<ArtifactKey>, StorageError> {
    if self.has_by_tag(project, selector).await? {
      return Ok(Some(ArtifactKey::Tag(selector.to_string())));
    }
    let id = ArtifactId(selector.to_string());
    if self.has_by_id(project, &id).await? {
      return Ok(Some(ArtifactKey::Id(id)));
    }
    Ok(None)
  }
}

/// Strip the artifact extension from a listed entry name.
///
/// Returns `None` for entries that are not artifact documents (temporary
/// files, nested keys, foreign files).
pub(crate) fn entry_stem(name: &str) -> Option<&str> {
  let stem = name.strip_suffix(".json")?;
  if stem.is_empty() || stem.contains('/') || stem.starts_with('.') {
    return None;
  }
  Some(stem)
}
