//! Remote to local synchronization.
//!
//! A pull lists the remote project, narrows the listing to the requested
//! selector, drops what is already present locally (unless forced) and
//! downloads the rest concurrently. Listing failures abort the pull; a failed
//! download only marks that item as failed.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::reference::ArtifactKey;
use crate::storage::{StorageError, StorageProvider};
use crate::util::hash::{ArtifactId, derive_artifact_id};

/// Outcome of a pull.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullResult {
  pub remote_tags: Vec<String>,
  pub remote_ids: Vec<ArtifactId>,
  pub pulled_tags: Vec<String>,
  pub pulled_ids: Vec<ArtifactId>,
  /// Candidates already present locally.
  pub skipped_tags: Vec<String>,
  pub skipped_ids: Vec<ArtifactId>,
  pub failed_tags: Vec<String>,
  pub failed_ids: Vec<ArtifactId>,
}

impl PullResult {
  pub fn pulled(&self) -> usize {
    self.pulled_tags.len() + self.pulled_ids.len()
  }

  pub fn skipped(&self) -> usize {
    self.skipped_tags.len() + self.skipped_ids.len()
  }

  pub fn failed(&self) -> usize {
    self.failed_tags.len() + self.failed_ids.len()
  }

  pub fn has_failures(&self) -> bool {
    self.failed() > 0
  }

  fn record(&mut self, key: ArtifactKey, outcome: Outcome) {
    match (key, outcome) {
      (ArtifactKey::Tag(tag), Outcome::Pulled) => self.pulled_tags.push(tag),
      (ArtifactKey::Id(id), Outcome::Pulled) => self.pulled_ids.push(id),
      (ArtifactKey::Tag(tag), Outcome::Skipped) => self.skipped_tags.push(tag),
      (ArtifactKey::Id(id), Outcome::Skipped) => self.skipped_ids.push(id),
      (ArtifactKey::Tag(tag), Outcome::Failed) => self.failed_tags.push(tag),
      (ArtifactKey::Id(id), Outcome::Failed) => self.failed_ids.push(id),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
  Pulled,
  Skipped,
  Failed,
}

/// Pull `project` from `remote` into `local`.
///
/// With a `selector`, only the matching tag (checked first) or id is pulled;
/// a selector matching neither fails with [`Error::SelectorNotFound`]. Without
/// `force`, items already present locally are skipped.
pub async fn pull(
  local: Arc<dyn StorageProvider>,
  remote: Arc<dyn StorageProvider>,
  project: &str,
  selector: Option<&str>,
  force: bool,
  config: &Config,
) -> Result<PullResult> {
  let remote_tags = remote.list_tags(project).await?;
  let remote_ids = remote.list_ids(project).await?;
  debug!(
    project,
    tags = remote_tags.len(),
    ids = remote_ids.len(),
    remote = %remote.location(),
    "listed remote"
  );

  let candidates = select_candidates(project, selector, &remote_tags, &remote_ids, &remote.location())?;

  let mut result = PullResult {
    remote_tags: remote_tags.into_iter().collect(),
    remote_ids: remote_ids.into_iter().collect(),
    ..PullResult::default()
  };

  let mut pending = Vec::with_capacity(candidates.len());
  for key in candidates {
    if !force && local.has(project, &key).await? {
      debug!(project, %key, "already present locally");
      result.record(key, Outcome::Skipped);
    } else {
      pending.push(key);
    }
  }

  if pending.is_empty() {
    info!(project, skipped = result.skipped(), "nothing to pull");
    return Ok(result);
  }

  local.ensure_project_setup(project).await?;

  let outcomes = download_all(&local, &remote, project, &pending, config.concurrency).await;
  for (key, outcome) in pending.into_iter().zip(outcomes) {
    result.record(key, outcome);
  }

  info!(
    project,
    pulled = result.pulled(),
    skipped = result.skipped(),
    failed = result.failed(),
    "pull finished"
  );
  Ok(result)
}

fn select_candidates(
  project: &str,
  selector: Option<&str>,
  tags: &BTreeSet<String>,
  ids: &BTreeSet<ArtifactId>,
  location: &str,
) -> Result<Vec<ArtifactKey>> {
  let Some(selector) = selector else {
    return Ok(
      tags
        .iter()
        .cloned()
        .map(ArtifactKey::Tag)
        .chain(ids.iter().cloned().map(ArtifactKey::Id))
        .collect(),
    );
  };

  if tags.contains(selector) {
    return Ok(vec![ArtifactKey::Tag(selector.to_string())]);
  }
  let id = ArtifactId(selector.to_string());
  if ids.contains(&id) {
    return Ok(vec![ArtifactKey::Id(id)]);
  }

  Err(Error::SelectorNotFound {
    project: project.to_string(),
    selector: selector.to_string(),
    location: location.to_string(),
  })
}

/// Download every key, at most `concurrency` at a time.
///
/// The returned outcomes are in the order of `keys`.
async fn download_all(
  local: &Arc<dyn StorageProvider>,
  remote: &Arc<dyn StorageProvider>,
  project: &str,
  keys: &[ArtifactKey],
  concurrency: usize,
) -> Vec<Outcome> {
  let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
  let mut join_set = JoinSet::new();

  for (index, key) in keys.iter().enumerate() {
    let key = key.clone();
    let local = local.clone();
    let remote = remote.clone();
    let project = project.to_string();
    let semaphore = semaphore.clone();

    join_set.spawn(async move {
      let _permit = semaphore.acquire().await;
      let result = transfer(local.as_ref(), remote.as_ref(), &project, &key).await;
      (index, key, result)
    });
  }

  // A panicked task leaves its slot unset and counts as failed.
  let mut outcomes = vec![Outcome::Failed; keys.len()];
  while let Some(joined) = join_set.join_next().await {
    match joined {
      Ok((index, key, Ok(()))) => {
        debug!(project, %key, "pulled");
        outcomes[index] = Outcome::Pulled;
      }
      Ok((_, key, Err(e))) => {
        warn!(project, %key, error = %e, "failed to pull");
      }
      Err(e) => {
        warn!(project, error = %e, "pull task panicked");
      }
    }
  }

  outcomes
}

async fn transfer(
  local: &dyn StorageProvider,
  remote: &dyn StorageProvider,
  project: &str,
  key: &ArtifactKey,
) -> Result<(), StorageError> {
  let content = remote.download(project, key).await?;
  let derived = derive_artifact_id(&content);

  match key {
    ArtifactKey::Tag(tag) => local.upload(project, &derived, Some(tag), &content).await,
    ArtifactKey::Id(id) => {
      if *id != derived {
        warn!(project, id = %id, derived = %derived, "remote id does not match its content");
      }
      local.upload(project, id, None, &content).await
    }
  }
}
