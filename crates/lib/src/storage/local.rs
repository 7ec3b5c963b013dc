//! Local filesystem artifact store.
//!
//! # Storage Layout
//!
//! ```text
//! {root}/
//! ├── summary.json            # Summary across all projects (derived)
//! └── <project>/
//!     ├── summary.json        # Summary for this project (derived)
//!     ├── tags/<tag>.json     # Hard link to (or copy of) the id file
//!     └── ids/<id>.json
//! ```
//!
//! Writes go through a temporary file followed by a rename so readers never
//! observe a partially written document. There is no locking: concurrent
//! writers to the same tag race and the last rename wins.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::debug;

use crate::consts::{ARTIFACT_EXT, IDS_DIR, SUMMARY_FILENAME, TAGS_DIR};
use crate::reference::{ArtifactKey, validate_name};
use crate::util::hash::ArtifactId;

use super::{StorageError, StorageProvider, entry_stem};

/// Artifact store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
  root: PathBuf,
}

impl LocalStorage {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn project_dir(&self, project: &str) -> Result<PathBuf, StorageError> {
    validate_name("project", project)?;
    Ok(self.root.join(project))
  }

  fn tag_path(&self, project: &str, tag: &str) -> Result<PathBuf, StorageError> {
    validate_name("tag", tag)?;
    Ok(
      self
        .project_dir(project)?
        .join(TAGS_DIR)
        .join(format!("{}.{}", tag, ARTIFACT_EXT)),
    )
  }

  fn id_path(&self, project: &str, id: &ArtifactId) -> Result<PathBuf, StorageError> {
    validate_name("id", id.as_str())?;
    Ok(
      self
        .project_dir(project)?
        .join(IDS_DIR)
        .join(format!("{}.{}", id, ARTIFACT_EXT)),
    )
  }

  /// Path of the persisted summary for a project, or for the whole store.
  pub fn summary_path(&self, project: Option<&str>) -> Result<PathBuf, StorageError> {
    match project {
      Some(project) => Ok(self.project_dir(project)?.join(SUMMARY_FILENAME)),
      None => Ok(self.root.join(SUMMARY_FILENAME)),
    }
  }

  /// List the projects present in the store.
  ///
  /// Only directories with a valid project name count; derived files such as
  /// the store-wide summary are skipped.
  pub async fn list_projects(&self) -> Result<BTreeSet<String>, StorageError> {
    let mut projects = BTreeSet::new();

    let mut entries = match fs::read_dir(&self.root).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(projects),
      Err(e) => return Err(StorageError::io(&self.root, e)),
    };

    while let Some(entry) = entries
      .next_entry()
      .await
      .map_err(|e| StorageError::io(&self.root, e))?
    {
      let is_dir = entry
        .file_type()
        .await
        .map_err(|e| StorageError::io(entry.path(), e))?
        .is_dir();
      let name = entry.file_name().to_string_lossy().to_string();
      if is_dir && validate_name("project", &name).is_ok() {
        projects.insert(name);
      }
    }

    Ok(projects)
  }

  async fn list_stems(&self, dir: &Path) -> Result<BTreeSet<String>, StorageError> {
    let mut stems = BTreeSet::new();

    let mut entries = match fs::read_dir(dir).await {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(stems),
      Err(e) => return Err(StorageError::io(dir, e)),
    };

    while let Some(entry) = entries.next_entry().await.map_err(|e| StorageError::io(dir, e))? {
      let name = entry.file_name().to_string_lossy().to_string();
      if let Some(stem) = entry_stem(&name) {
        stems.insert(stem.to_string());
      }
    }

    Ok(stems)
  }

  async fn read(&self, path: &Path, project: &str, key: ArtifactKey) -> Result<Vec<u8>, StorageError> {
    match fs::read(path).await {
      Ok(content) => Ok(content),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound {
        project: project.to_string(),
        key,
      }),
      Err(e) => Err(StorageError::io(path, e)),
    }
  }

  /// Write the content of an id file, atomically.
  async fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StorageError> {
    let target = path.to_path_buf();
    let content = content.to_vec();
    run_blocking(path, move || {
      let mut file = temp_file_beside(&target)?;
      file.write_all(&content)?;
      file.as_file().sync_all()?;
      file.persist(&target).map_err(|e| e.error)?;
      Ok(())
    })
    .await
  }

  /// Point `tag_path` at the id file: hard link when possible, copy otherwise.
  async fn alias(id_path: &Path, tag_path: &Path) -> Result<(), StorageError> {
    let source = id_path.to_path_buf();
    let target = tag_path.to_path_buf();
    run_blocking(tag_path, move || {
      let temp = temp_file_beside(&target)?.into_temp_path();
      std::fs::remove_file(&temp)?;
      if let Err(e) = std::fs::hard_link(&source, &temp) {
        debug!(error = %e, "hard link failed, copying instead");
        std::fs::copy(&source, &temp)?;
      }
      temp.persist(&target).map_err(|e| e.error)
    })
    .await
  }
}

/// Create a uniquely named temporary file next to `path`.
///
/// Every writer gets its own file, so concurrent writes of the same target
/// never share a temporary path and the last rename wins.
fn temp_file_beside(path: &Path) -> io::Result<NamedTempFile> {
  let dir = path.parent().unwrap_or_else(|| Path::new("."));
  tempfile::Builder::new().prefix(".").suffix(".tmp").tempfile_in(dir)
}

async fn run_blocking<F>(path: &Path, op: F) -> Result<(), StorageError>
where
  F: FnOnce() -> io::Result<()> + Send + 'static,
{
  tokio::task::spawn_blocking(op)
    .await
    .map_err(|e| StorageError::io(path, io::Error::other(e)))?
    .map_err(|e| StorageError::io(path, e))
}

#[async_trait]
impl StorageProvider for LocalStorage {
  fn location(&self) -> String {
    self.root.display().to_string()
  }

  async fn ensure_project_setup(&self, project: &str) -> Result<(), StorageError> {
    let dir = self.project_dir(project)?;
    for sub in [TAGS_DIR, IDS_DIR] {
      let path = dir.join(sub);
      fs::create_dir_all(&path).await.map_err(|e| StorageError::io(&path, e))?;
    }
    Ok(())
  }

  async fn list_tags(&self, project: &str) -> Result<BTreeSet<String>, StorageError> {
    let dir = self.project_dir(project)?.join(TAGS_DIR);
    self.list_stems(&dir).await
  }

  async fn list_ids(&self, project: &str) -> Result<BTreeSet<ArtifactId>, StorageError> {
    let dir = self.project_dir(project)?.join(IDS_DIR);
    Ok(self.list_stems(&dir).await?.into_iter().map(ArtifactId).collect())
  }

  async fn has_by_tag(&self, project: &str, tag: &str) -> Result<bool, StorageError> {
    let path = self.tag_path(project, tag)?;
    fs::try_exists(&path).await.map_err(|e| StorageError::io(&path, e))
  }

  async fn has_by_id(&self, project: &str, id: &ArtifactId) -> Result<bool, StorageError> {
    let path = self.id_path(project, id)?;
    fs::try_exists(&path).await.map_err(|e| StorageError::io(&path, e))
  }

  async fn upload(
    &self,
    project: &str,
    id: &ArtifactId,
    tag: Option<&str>,
    content: &[u8],
  ) -> Result<(), StorageError> {
    self.ensure_project_setup(project).await?;

    let id_path = self.id_path(project, id)?;
    if fs::try_exists(&id_path).await.map_err(|e| StorageError::io(&id_path, e))? {
      debug!(project, id = %id, "id already stored");
    } else {
      Self::write_atomic(&id_path, content).await?;
      debug!(project, id = %id, bytes = content.len(), "stored id");
    }

    if let Some(tag) = tag {
      let tag_path = self.tag_path(project, tag)?;
      Self::alias(&id_path, &tag_path).await?;
      debug!(project, tag, id = %id, "pointed tag at id");
    }

    Ok(())
  }

  async fn download_by_tag(&self, project: &str, tag: &str) -> Result<Vec<u8>, StorageError> {
    let path = self.tag_path(project, tag)?;
    self.read(&path, project, ArtifactKey::Tag(tag.to_string())).await
  }

  async fn download_by_id(&self, project: &str, id: &ArtifactId) -> Result<Vec<u8>, StorageError> {
    let path = self.id_path(project, id)?;
    self.read(&path, project, ArtifactKey::Id(id.clone())).await
  }
}
