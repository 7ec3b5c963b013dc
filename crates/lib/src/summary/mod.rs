//! Contract and release indices.
//!
//! A summary maps every contract to the releases it appears in, and every
//! release to its contracts. It is derived entirely from the local store and
//! can be deleted and rebuilt at any time.
//!
//! ```json
//! {
//!   "contracts": { "contracts/Token.sol:Token": ["v1.0.0", "v1.1.0", "latest"] },
//!   "releases": { "v1.0.0": ["contracts/Token.sol:Token"], "...": [] }
//! }
//! ```
//!
//! With `filter_similar`, a contract's versioned releases are only listed when
//! its digest differs from the previously listed versioned release. Opaque
//! releases (`latest`, untagged ids) are always listed and do not reset the
//! comparison.

mod version;

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::artifact::{Artifact, ArtifactError, ContractKey};
use crate::error::Result;
use crate::reference::{ArtifactKey, validate_name};
use crate::storage::{LocalStorage, StorageProvider};
use crate::util::hash::{ContractDigest, derive_artifact_id, hash_contract};

pub use version::ReleaseVersion;

#[derive(Debug, Error)]
pub enum SummaryError {
  #[error("release '{release}' could not be loaded: {source}")]
  Release {
    release: String,
    #[source]
    source: ArtifactError,
  },

  #[error("failed to write summary {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to serialize summary: {0}")]
  Serialize(#[from] serde_json::Error),
}

/// Which releases a summary covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryScope {
  Project(String),
  /// Every project in the store; releases are labelled `<project>:<release>`.
  All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
  pub contracts: BTreeMap<String, Vec<String>>,
  pub releases: BTreeMap<String, Vec<String>>,
}

/// A loaded release with its contract digests.
#[derive(Debug)]
struct Release {
  label: String,
  version: ReleaseVersion,
  contracts: BTreeMap<ContractKey, ContractDigest>,
}

/// Build the summary for `scope` from the local store.
pub async fn build_summary(storage: &LocalStorage, scope: &SummaryScope, filter_similar: bool) -> Result<Summary> {
  let projects: Vec<String> = match scope {
    SummaryScope::Project(project) => {
      validate_name("project", project)?;
      vec![project.clone()]
    }
    SummaryScope::All => storage.list_projects().await?.into_iter().collect(),
  };

  let mut summary = Summary::default();
  for project in &projects {
    let label_prefix = match scope {
      SummaryScope::Project(_) => None,
      SummaryScope::All => Some(project.as_str()),
    };
    let releases = load_releases(storage, project, label_prefix).await?;
    debug!(project, releases = releases.len(), "loaded releases");
    index_project(&mut summary, &releases, filter_similar);
  }

  info!(
    projects = projects.len(),
    contracts = summary.contracts.len(),
    releases = summary.releases.len(),
    "built summary"
  );
  Ok(summary)
}

/// Write `summary` next to the releases it was built from.
///
/// Returns the path written: `<root>/<project>/summary.json` or
/// `<root>/summary.json`.
pub async fn write_summary(storage: &LocalStorage, scope: &SummaryScope, summary: &Summary) -> Result<PathBuf> {
  let path = match scope {
    SummaryScope::Project(project) => storage.summary_path(Some(project))?,
    SummaryScope::All => storage.summary_path(None)?,
  };

  let content = serde_json::to_vec_pretty(summary).map_err(SummaryError::from)?;
  write_atomic(&path, &content).await?;
  debug!(path = %path.display(), "wrote summary");
  Ok(path)
}

/// Build and persist a summary.
pub async fn summarize(storage: &LocalStorage, scope: &SummaryScope, filter_similar: bool) -> Result<(Summary, PathBuf)> {
  let summary = build_summary(storage, scope, filter_similar).await?;
  let path = write_summary(storage, scope, &summary).await?;
  Ok((summary, path))
}

fn write_error(path: &Path) -> impl FnOnce(io::Error) -> SummaryError {
  let path = path.to_path_buf();
  move |source| SummaryError::Write { path, source }
}

async fn write_atomic(path: &Path, content: &[u8]) -> Result<(), SummaryError> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).await.map_err(write_error(parent))?;
  }
  let temp_path = path.with_extension("json.tmp");
  fs::write(&temp_path, content).await.map_err(write_error(&temp_path))?;
  fs::rename(&temp_path, path).await.map_err(write_error(path))
}

/// Load every release of `project`: all tags, plus ids no tag points at.
///
/// Releases come back in release order.
async fn load_releases(storage: &LocalStorage, project: &str, label_prefix: Option<&str>) -> Result<Vec<Release>> {
  let label = |name: &str| match label_prefix {
    Some(prefix) => format!("{}:{}", prefix, name),
    None => name.to_string(),
  };

  let mut releases = Vec::new();
  let mut aliased = BTreeSet::new();

  for tag in storage.list_tags(project).await? {
    let content = storage.download(project, &ArtifactKey::Tag(tag.clone())).await?;
    aliased.insert(derive_artifact_id(&content));
    releases.push(Release {
      label: label(&tag),
      version: ReleaseVersion::parse(&tag),
      contracts: digest_release(&label(&tag), &content)?,
    });
  }

  for id in storage.list_ids(project).await? {
    if aliased.contains(&id) {
      continue;
    }
    let content = storage.download_by_id(project, &id).await?;
    releases.push(Release {
      label: label(id.as_str()),
      version: ReleaseVersion::Opaque(id.to_string()),
      contracts: digest_release(&label(id.as_str()), &content)?,
    });
  }

  releases.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.label.cmp(&b.label)));
  Ok(releases)
}

fn digest_release(label: &str, content: &[u8]) -> Result<BTreeMap<ContractKey, ContractDigest>, SummaryError> {
  let artifact = Artifact::from_slice(content).map_err(|source| SummaryError::Release {
    release: label.to_string(),
    source,
  })?;
  Ok(
    artifact
      .contracts
      .iter()
      .map(|(key, entry)| (key.clone(), hash_contract(entry)))
      .collect(),
  )
}

/// Add one project's releases to `summary`. `releases` must be in release
/// order.
fn index_project(summary: &mut Summary, releases: &[Release], filter_similar: bool) {
  for release in releases {
    summary.releases.entry(release.label.clone()).or_default();
  }

  let keys: BTreeSet<&ContractKey> = releases.iter().flat_map(|r| r.contracts.keys()).collect();

  for key in keys {
    let contract = key.to_string();
    let mut cursor: Option<&ContractDigest> = None;

    for release in releases {
      let Some(digest) = release.contracts.get(key) else {
        continue;
      };

      let keep = match (&release.version, filter_similar) {
        (_, false) | (ReleaseVersion::Opaque(_), true) => true,
        (ReleaseVersion::Ordered(_), true) => {
          let changed = cursor != Some(digest);
          if changed {
            cursor = Some(digest);
          }
          changed
        }
      };

      if keep {
        summary
          .contracts
          .entry(contract.clone())
          .or_default()
          .push(release.label.clone());
        summary
          .releases
          .entry(release.label.clone())
          .or_default()
          .push(contract.clone());
      }
    }
  }
}
