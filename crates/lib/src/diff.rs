//! Contract-level change detection between two artifacts.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::artifact::{Artifact, ContractKey, load_from_path};
use crate::error::Result;
use crate::storage::StorageProvider;
use crate::util::hash::{ContractDigest, hash_contract};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
  Added,
  Removed,
  Changed,
}

impl ContractStatus {
  pub fn symbol(self) -> char {
    match self {
      ContractStatus::Added => '+',
      ContractStatus::Removed => '-',
      ContractStatus::Changed => '~',
    }
  }
}

impl fmt::Display for ContractStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ContractStatus::Added => write!(f, "added"),
      ContractStatus::Removed => write!(f, "removed"),
      ContractStatus::Changed => write!(f, "changed"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ContractChange {
  pub path: String,
  pub name: String,
  pub status: ContractStatus,
}

impl ContractChange {
  fn new(key: &ContractKey, status: ContractStatus) -> Self {
    Self {
      path: key.path.clone(),
      name: key.name.clone(),
      status,
    }
  }
}

fn digests(artifact: &Artifact) -> BTreeMap<&ContractKey, ContractDigest> {
  artifact
    .contracts
    .iter()
    .map(|(key, entry)| (key, hash_contract(entry)))
    .collect()
}

/// Compare `fresh` against `reference`.
///
/// Without a reference every fresh contract is added. Unchanged contracts are
/// omitted. The result is sorted by path, then name.
pub fn diff_artifacts(fresh: &Artifact, reference: Option<&Artifact>) -> Vec<ContractChange> {
  let Some(reference) = reference else {
    return fresh
      .contracts
      .keys()
      .map(|key| ContractChange::new(key, ContractStatus::Added))
      .collect();
  };

  let fresh = digests(fresh);
  let reference = digests(reference);

  let mut changes = Vec::new();
  for (key, digest) in &fresh {
    match reference.get(key) {
      None => changes.push(ContractChange::new(key, ContractStatus::Added)),
      Some(previous) if previous != digest => changes.push(ContractChange::new(key, ContractStatus::Changed)),
      Some(_) => {}
    }
  }
  for key in reference.keys() {
    if !fresh.contains_key(key) {
      changes.push(ContractChange::new(key, ContractStatus::Removed));
    }
  }

  changes.sort();
  changes
}

/// Diff the artifact at `path` against release `selector` of `project`.
///
/// A missing reference is not an error: it is logged and every contract is
/// reported as added.
pub async fn diff(
  path: &Path,
  storage: &dyn StorageProvider,
  project: &str,
  selector: &str,
) -> Result<Vec<ContractChange>> {
  let (_, fresh) = load_from_path(path).await?;

  let reference = match storage.resolve(project, selector).await? {
    Some(key) => {
      debug!(project, %key, "diffing against reference");
      let content = storage.download(project, &key).await?;
      Some(Artifact::from_slice(&content)?)
    }
    None => {
      warn!(
        project,
        selector,
        location = %storage.location(),
        "reference artifact not found, treating every contract as added"
      );
      None
    }
  };

  Ok(diff_artifacts(&fresh, reference.as_ref()))
}
