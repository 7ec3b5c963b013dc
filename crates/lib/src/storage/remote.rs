//! Remote artifact store over an [`ObjectStore`].
//!
//! Keys mirror the local layout under an optional prefix:
//! `{prefix}/{project}/tags/{tag}.json` and `{prefix}/{project}/ids/{id}.json`.
//! Tags are stored as full copies since buckets have no links.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::consts::{ARTIFACT_EXT, IDS_DIR, TAGS_DIR};
use crate::reference::{ArtifactKey, validate_name};
use crate::util::hash::ArtifactId;

use super::{ObjectStore, StorageError, StorageProvider, entry_stem};

#[derive(Debug, Clone)]
pub struct RemoteStorage {
  store: Arc<dyn ObjectStore>,
  prefix: String,
}

impl RemoteStorage {
  pub fn new(store: Arc<dyn ObjectStore>, prefix: &str) -> Self {
    Self {
      store,
      prefix: prefix.trim_matches('/').to_string(),
    }
  }

  pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
    &self.store
  }

  fn dir_key(&self, project: &str, dir: &str) -> Result<String, StorageError> {
    validate_name("project", project)?;
    if self.prefix.is_empty() {
      Ok(format!("{}/{}/", project, dir))
    } else {
      Ok(format!("{}/{}/{}/", self.prefix, project, dir))
    }
  }

  fn tag_key(&self, project: &str, tag: &str) -> Result<String, StorageError> {
    validate_name("tag", tag)?;
    Ok(format!("{}{}.{}", self.dir_key(project, TAGS_DIR)?, tag, ARTIFACT_EXT))
  }

  fn id_key(&self, project: &str, id: &ArtifactId) -> Result<String, StorageError> {
    validate_name("id", id.as_str())?;
    Ok(format!("{}{}.{}", self.dir_key(project, IDS_DIR)?, id, ARTIFACT_EXT))
  }

  async fn list_stems(&self, prefix: &str) -> Result<BTreeSet<String>, StorageError> {
    let keys = self.store.list(prefix).await?;
    Ok(
      keys
        .iter()
        .filter_map(|key| key.strip_prefix(prefix))
        .filter_map(entry_stem)
        .map(str::to_string)
        .collect(),
    )
  }

  async fn fetch(&self, key: &str, project: &str, artifact: ArtifactKey) -> Result<Vec<u8>, StorageError> {
    self.store.get(key).await?.ok_or_else(|| StorageError::NotFound {
      project: project.to_string(),
      key: artifact,
    })
  }
}

#[async_trait]
impl StorageProvider for RemoteStorage {
  fn location(&self) -> String {
    if self.prefix.is_empty() {
      self.store.location()
    } else {
      format!("{}/{}", self.store.location().trim_end_matches('/'), self.prefix)
    }
  }

  async fn ensure_project_setup(&self, project: &str) -> Result<(), StorageError> {
    // Buckets create prefixes implicitly.
    validate_name("project", project)?;
    Ok(())
  }

  async fn list_tags(&self, project: &str) -> Result<BTreeSet<String>, StorageError> {
    let prefix = self.dir_key(project, TAGS_DIR)?;
    self.list_stems(&prefix).await
  }

  async fn list_ids(&self, project: &str) -> Result<BTreeSet<ArtifactId>, StorageError> {
    let prefix = self.dir_key(project, IDS_DIR)?;
    Ok(self.list_stems(&prefix).await?.into_iter().map(ArtifactId).collect())
  }

  async fn has_by_tag(&self, project: &str, tag: &str) -> Result<bool, StorageError> {
    self.store.exists(&self.tag_key(project, tag)?).await
  }

  async fn has_by_id(&self, project: &str, id: &ArtifactId) -> Result<bool, StorageError> {
    self.store.exists(&self.id_key(project, id)?).await
  }

  async fn upload(
    &self,
    project: &str,
    id: &ArtifactId,
    tag: Option<&str>,
    content: &[u8],
  ) -> Result<(), StorageError> {
    let id_key = self.id_key(project, id)?;
    if self.store.exists(&id_key).await? {
      debug!(key = %id_key, "id already uploaded");
    } else {
      self.store.put(&id_key, content).await?;
      debug!(key = %id_key, bytes = content.len(), "uploaded id");
    }

    if let Some(tag) = tag {
      let tag_key = self.tag_key(project, tag)?;
      self.store.put(&tag_key, content).await?;
      debug!(key = %tag_key, id = %id, "uploaded tag");
    }

    Ok(())
  }

  async fn download_by_tag(&self, project: &str, tag: &str) -> Result<Vec<u8>, StorageError> {
    let key = self.tag_key(project, tag)?;
    self.fetch(&key, project, ArtifactKey::Tag(tag.to_string())).await
  }

  async fn download_by_id(&self, project: &str, id: &ArtifactId) -> Result<Vec<u8>, StorageError> {
    let key = self.id_key(project, id)?;
    self.fetch(&key, project, ArtifactKey::Id(id.clone())).await
  }
}
