//! Artifact references and name validation.
//!
//! A reference is written `<project>` (every artifact of the project) or
//! `<project>:<tagOrId>` (one artifact; tags are checked before ids).

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::util::hash::ArtifactId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
  #[error("empty reference")]
  Empty,

  #[error("invalid {kind} name '{name}': {reason}")]
  InvalidName {
    kind: &'static str,
    name: String,
    reason: &'static str,
  },

  #[error("reference '{0}' must name a tag or id (expected <project>:<tagOrId>)")]
  MissingSelector(String),
}

/// Validate a project, tag or id name.
///
/// Names become path segments and object keys, so they are restricted to
/// ASCII alphanumerics and `.`, `-`, `_`, `+`, and may not start with `.` or `_`.
pub fn validate_name(kind: &'static str, name: &str) -> Result<(), ReferenceError> {
  let invalid = |reason| ReferenceError::InvalidName {
    kind,
    name: name.to_string(),
    reason,
  };

  if name.is_empty() {
    return Err(invalid("must not be empty"));
  }
  if name.starts_with('.') || name.starts_with('_') {
    return Err(invalid("must not start with '.' or '_'"));
  }
  if !name
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+'))
  {
    return Err(invalid("only ASCII letters, digits, '.', '-', '_' and '+' are allowed"));
  }
  Ok(())
}

/// A key inside one project: either a tag or an id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum ArtifactKey {
  Tag(String),
  Id(ArtifactId),
}

impl ArtifactKey {
  pub fn name(&self) -> &str {
    match self {
      ArtifactKey::Tag(tag) => tag,
      ArtifactKey::Id(id) => id.as_str(),
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      ArtifactKey::Tag(_) => "tag",
      ArtifactKey::Id(_) => "id",
    }
  }
}

impl fmt::Display for ArtifactKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} '{}'", self.kind(), self.name())
  }
}

/// A parsed `<project>[:<tagOrId>]` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
  pub project: String,
  pub selector: Option<String>,
}

impl Reference {
  pub fn project(project: impl Into<String>) -> Self {
    Self {
      project: project.into(),
      selector: None,
    }
  }

  pub fn with_selector(project: impl Into<String>, selector: impl Into<String>) -> Self {
    Self {
      project: project.into(),
      selector: Some(selector.into()),
    }
  }

  /// The selector, or an error when the reference names a whole project.
  pub fn require_selector(&self) -> Result<&str, ReferenceError> {
    self
      .selector
      .as_deref()
      .ok_or_else(|| ReferenceError::MissingSelector(self.to_string()))
  }
}

impl FromStr for Reference {
  type Err = ReferenceError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    if s.is_empty() {
      return Err(ReferenceError::Empty);
    }

    let (project, selector) = match s.split_once(':') {
      Some((project, selector)) => (project, Some(selector)),
      None => (s, None),
    };

    validate_name("project", project)?;
    if let Some(selector) = selector {
      validate_name("tag or id", selector)?;
    }

    Ok(Self {
      project: project.to_string(),
      selector: selector.map(str::to_string),
    })
  }
}

impl fmt::Display for Reference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.selector {
      Some(selector) => write!(f, "{}:{}", self.project, selector),
      None => write!(f, "{}", self.project),
    }
  }
}
