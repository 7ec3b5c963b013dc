//! Shared fixtures for library integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use abivault_lib::Config;
use abivault_lib::storage::{DirObjectStore, LocalStorage, RemoteStorage, StorageProvider};
use serde_json::{Value, json};
use tempfile::TempDir;

/// A local store, a directory-backed remote and a scratch directory for
/// freshly built artifacts.
pub struct Workspace {
  pub temp: TempDir,
  pub config: Config,
  pub local: Arc<LocalStorage>,
  pub remote: Arc<RemoteStorage>,
}

impl Workspace {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let config = Config::with_root(temp.path().join("local"));
    let local = Arc::new(config.local_storage());
    let bucket = Arc::new(DirObjectStore::new(temp.path().join("bucket")));
    let remote = Arc::new(RemoteStorage::new(bucket, "artifacts"));
    Self {
      temp,
      config,
      local,
      remote,
    }
  }

  pub fn local_provider(&self) -> Arc<dyn StorageProvider> {
    self.local.clone()
  }

  pub fn remote_provider(&self) -> Arc<dyn StorageProvider> {
    self.remote.clone()
  }

  /// Write a build-info document to `build/<name>` and return its path.
  pub fn write_build(&self, name: &str, contracts: &[(&str, &str, &str)]) -> PathBuf {
    let dir = self.temp.path().join("build");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, build_info(contracts)).unwrap();
    path
  }
}

/// Build-info bytes for `(path, name, bytecode)` triples.
pub fn build_info(contracts: &[(&str, &str, &str)]) -> Vec<u8> {
  let mut by_path = serde_json::Map::new();
  for (path, name, bytecode) in contracts {
    let entry = by_path
      .entry(path.to_string())
      .or_insert_with(|| Value::Object(Default::default()));
    entry.as_object_mut().unwrap().insert(
      name.to_string(),
      json!({
        "abi": [{ "type": "function", "name": "owner", "inputs": [], "outputs": [] }],
        "evm": { "bytecode": { "object": bytecode } },
        "metadata": "{}"
      }),
    );
  }

  serde_json::to_vec(&json!({
    "_format": "hh-sol-build-info-1",
    "id": "0f",
    "solcVersion": "0.8.24",
    "solcLongVersion": "0.8.24+commit.e11b9ed9",
    "input": { "language": "Solidity", "sources": {} },
    "output": { "contracts": by_path }
  }))
  .unwrap()
}
