//! Publishing artifacts.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::artifact::{ArtifactFormat, load_from_path};
use crate::error::{Error, Result};
use crate::reference::validate_name;
use crate::storage::StorageProvider;
use crate::util::hash::{ArtifactId, derive_artifact_id};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushResult {
  pub project: String,
  pub id: ArtifactId,
  pub tag: Option<String>,
  pub format: ArtifactFormat,
  pub contracts: usize,
  /// Document size in bytes.
  pub size: u64,
  /// Whether an existing tag was repointed.
  pub overwritten: bool,
}

/// Publish the artifact at `path` to `storage` under `project`.
///
/// An existing `tag` is a conflict unless `force` is set, in which case only
/// the tag pointer moves; previously stored ids are left in place.
pub async fn push(
  storage: &dyn StorageProvider,
  path: &Path,
  project: &str,
  tag: Option<&str>,
  force: bool,
) -> Result<PushResult> {
  validate_name("project", project)?;
  if let Some(tag) = tag {
    validate_name("tag", tag)?;
  }

  let (content, artifact) = load_from_path(path).await?;

  storage.ensure_project_setup(project).await?;

  let mut overwritten = false;
  if let Some(tag) = tag
    && storage.has_by_tag(project, tag).await?
  {
    if !force {
      return Err(Error::Conflict {
        project: project.to_string(),
        tag: tag.to_string(),
      });
    }
    warn!(project, tag, "overwriting existing tag");
    overwritten = true;
  }

  let id = derive_artifact_id(&content);
  storage.upload(project, &id, tag, &content).await?;

  info!(
    project,
    id = %id,
    tag = tag.unwrap_or("-"),
    contracts = artifact.contracts.len(),
    location = %storage.location(),
    "pushed artifact"
  );

  Ok(PushResult {
    project: project.to_string(),
    id,
    tag: tag.map(str::to_string),
    format: artifact.format,
    contracts: artifact.contracts.len(),
    size: content.len() as u64,
    overwritten,
  })
}
