//! Artifact documents: loading, format detection and validation.
//!
//! An artifact is stored and addressed as raw bytes. [`Artifact`] is the
//! parsed, validated view of those bytes used by diffing and summaries.

mod types;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::consts::ARTIFACT_EXT;

pub use types::{ArtifactFormat, ContractEntry, ContractKey, HARDHAT_BUILD_INFO_FORMAT};
use types::{CompilerOutput, HardhatBuildInfo, StandardJson};

/// Errors raised while locating or validating an artifact document.
#[derive(Debug, Error)]
pub enum ArtifactError {
  #[error("artifact input not found: {0}")]
  MissingInput(PathBuf),

  #[error("no artifact document (*.json) found in {0}")]
  EmptyDirectory(PathBuf),

  #[error("ambiguous artifact input in {dir}: found {} candidate files", candidates.len())]
  AmbiguousInput { dir: PathBuf, candidates: Vec<PathBuf> },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("malformed artifact document: {0}")]
  Parse(#[source] serde_json::Error),

  #[error("unsupported artifact format: {0}")]
  UnsupportedFormat(String),

  #[error("unrecognized artifact document: {0}")]
  UnrecognizedShape(String),
}

/// A validated artifact document.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
  pub format: ArtifactFormat,
  /// Producer build id (Hardhat build-info only).
  pub build_id: Option<String>,
  /// Full compiler version (Hardhat build-info only).
  pub compiler_version: Option<String>,
  /// Compiler input section, kept opaque.
  pub input: Value,
  pub contracts: BTreeMap<ContractKey, ContractEntry>,
}

impl Artifact {
  /// Parse and validate an artifact document.
  ///
  /// The format is detected from the `_format` field: a Hardhat build-info
  /// marker selects that schema, no marker selects plain standard-JSON, and any
  /// other marker is rejected.
  pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
    let value: Value = serde_json::from_slice(bytes).map_err(ArtifactError::Parse)?;

    let marker = match &value {
      Value::Object(object) => object.get("_format").cloned(),
      _ => return Err(ArtifactError::UnrecognizedShape("document is not a JSON object".to_string())),
    };

    let artifact = match marker {
      Some(Value::String(format)) if format == HARDHAT_BUILD_INFO_FORMAT => {
        let info: HardhatBuildInfo = serde_json::from_value(value).map_err(ArtifactError::Parse)?;
        debug!(format = %info.format, solc = %info.solc_version, "parsed build-info document");
        Self::assemble(
          ArtifactFormat::HardhatBuildInfoV1,
          Some(info.id),
          Some(info.solc_long_version),
          info.input,
          info.output,
        )?
      }
      Some(Value::String(format)) => return Err(ArtifactError::UnsupportedFormat(format)),
      Some(_) => return Err(ArtifactError::UnrecognizedShape("`_format` is not a string".to_string())),
      None => {
        let doc: StandardJson = serde_json::from_value(value).map_err(ArtifactError::Parse)?;
        Self::assemble(ArtifactFormat::SolcStandardJson, None, None, doc.input, doc.output)?
      }
    };

    Ok(artifact)
  }

  fn assemble(
    format: ArtifactFormat,
    build_id: Option<String>,
    compiler_version: Option<String>,
    input: Value,
    output: CompilerOutput,
  ) -> Result<Self, ArtifactError> {
    if !input.is_object() {
      return Err(ArtifactError::UnrecognizedShape("`input` is not an object".to_string()));
    }

    let mut contracts = BTreeMap::new();
    for (path, by_name) in output.contracts {
      for (name, contract) in by_name {
        contracts.insert(ContractKey::new(path.clone(), name), ContractEntry::from(contract));
      }
    }

    Ok(Self {
      format,
      build_id,
      compiler_version,
      input,
      contracts,
    })
  }
}

/// Resolve the path given for a freshly produced artifact.
///
/// A file is taken as-is. A directory must contain exactly one `*.json` file.
pub async fn resolve_input_path(path: &Path) -> Result<PathBuf, ArtifactError> {
  let metadata = match tokio::fs::metadata(path).await {
    Ok(metadata) => metadata,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ArtifactError::MissingInput(path.to_path_buf())),
    Err(e) => {
      return Err(ArtifactError::Read {
        path: path.to_path_buf(),
        source: e,
      });
    }
  };

  if !metadata.is_dir() {
    return Ok(path.to_path_buf());
  }

  let read_err = |e| ArtifactError::Read {
    path: path.to_path_buf(),
    source: e,
  };

  let mut candidates = Vec::new();
  let mut entries = tokio::fs::read_dir(path).await.map_err(read_err)?;
  while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
    let candidate = entry.path();
    let is_json = candidate.extension().is_some_and(|ext| ext == ARTIFACT_EXT);
    if is_json && entry.file_type().await.map_err(read_err)?.is_file() {
      candidates.push(candidate);
    }
  }
  candidates.sort();

  match candidates.len() {
    0 => Err(ArtifactError::EmptyDirectory(path.to_path_buf())),
    1 => Ok(candidates.remove(0)),
    _ => Err(ArtifactError::AmbiguousInput {
      dir: path.to_path_buf(),
      candidates,
    }),
  }
}

/// Locate, read and validate a freshly produced artifact.
///
/// Returns the raw bytes (what gets stored and addressed) together with the
/// parsed view.
pub async fn load_from_path(path: &Path) -> Result<(Vec<u8>, Artifact), ArtifactError> {
  let file = resolve_input_path(path).await?;
  let bytes = tokio::fs::read(&file).await.map_err(|e| ArtifactError::Read {
    path: file.clone(),
    source: e,
  })?;
  let artifact = Artifact::from_slice(&bytes)?;
  debug!(path = %file.display(), contracts = artifact.contracts.len(), "loaded artifact");
  Ok((bytes, artifact))
}
