//! Crate-level error type.
//!
//! Every operation returns [`Error`]. Expected failures (bad input, missing
//! artifacts, tag conflicts) are user-facing and carry a concise message;
//! infrastructure failures keep their full source chain for debugging.

use thiserror::Error;

use crate::artifact::ArtifactError;
use crate::config::ConfigError;
use crate::reference::{ArtifactKey, ReferenceError};
use crate::storage::StorageError;
use crate::summary::SummaryError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  Conflict,
  Infrastructure,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Artifact(#[from] ArtifactError),

  #[error(transparent)]
  Reference(#[from] ReferenceError),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("{key} not found in project '{project}'")]
  NotFound { project: String, key: ArtifactKey },

  #[error("'{selector}' is neither a tag nor an id of project '{project}' in {location}")]
  SelectorNotFound {
    project: String,
    selector: String,
    location: String,
  },

  #[error("tag '{tag}' already exists in project '{project}' (use --force to overwrite)")]
  Conflict { project: String, tag: String },

  #[error(transparent)]
  Summary(#[from] SummaryError),

  #[error(transparent)]
  Storage(StorageError),
}

impl From<StorageError> for Error {
  fn from(err: StorageError) -> Self {
    match err {
      StorageError::NotFound { project, key } => Error::NotFound { project, key },
      StorageError::InvalidName(err) => Error::Reference(err),
      other => Error::Storage(other),
    }
  }
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Artifact(ArtifactError::Read { .. }) => ErrorKind::Infrastructure,
      Error::Artifact(_) | Error::Reference(_) | Error::Config(_) => ErrorKind::Validation,
      Error::Summary(SummaryError::Release { .. }) => ErrorKind::Validation,
      Error::Summary(_) => ErrorKind::Infrastructure,
      Error::Storage(StorageError::InvalidLocation(_)) => ErrorKind::Validation,
      Error::NotFound { .. } | Error::SelectorNotFound { .. } => ErrorKind::NotFound,
      Error::Conflict { .. } => ErrorKind::Conflict,
      Error::Storage(_) => ErrorKind::Infrastructure,
    }
  }

  /// Whether this is an expected, user-actionable failure.
  pub fn is_user_facing(&self) -> bool {
    self.kind() != ErrorKind::Infrastructure
  }
}
