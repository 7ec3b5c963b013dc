//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::{Value, json};
use tempfile::TempDir;

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the local store, a
/// directory-backed remote bucket and the artifacts written by the test.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  fn dir(&self, name: &str) -> PathBuf {
    let p = self.temp.path().join(name);
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Local store root (isolated per test).
  pub fn root_path(&self) -> PathBuf {
    self.dir("store")
  }

  /// Remote bucket directory (isolated per test).
  pub fn bucket_path(&self) -> PathBuf {
    self.dir("bucket")
  }

  pub fn build_path(&self, file: &str) -> PathBuf {
    self.dir("build").join(file)
  }

  /// Write a build-info artifact with `(path, name, bytecode)` contracts and
  /// return its path.
  pub fn write_artifact(&self, file: &str, contracts: &[(&str, &str, &str)]) -> PathBuf {
    let path = self.build_path(file);
    std::fs::write(&path, serde_json::to_vec_pretty(&build_info(contracts)).unwrap()).unwrap();
    path
  }

  /// Get a pre-configured Command for the abivault binary.
  ///
  /// Sets environment variables for isolated testing:
  /// - `ABIVAULT_ROOT`: Isolated local store
  /// - `ABIVAULT_REMOTE_URL`: Isolated directory bucket
  /// - `XDG_CONFIG_HOME` / `APPDATA`: Empty config directory
  pub fn abivault_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("abivault");
    cmd.current_dir(self.temp.path());
    cmd.env("ABIVAULT_ROOT", self.root_path());
    cmd.env("ABIVAULT_REMOTE_URL", self.bucket_path());
    cmd.env("XDG_CONFIG_HOME", self.dir("config"));
    cmd.env("APPDATA", self.dir("config")); // For Windows
    cmd.env_remove("ABIVAULT_CONFIG");
    cmd.env_remove("ABIVAULT_REMOTE_TOKEN");
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// Run a command with `-o json` and parse its stdout.
  pub fn json(&self, args: &[&str]) -> Value {
    let output = self.abivault_cmd().args(args).args(["-o", "json"]).output().unwrap();
    assert!(
      output.status.success(),
      "command {:?} failed: {}",
      args,
      String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
  }
}

pub fn build_info(contracts: &[(&str, &str, &str)]) -> Value {
  let mut by_path = serde_json::Map::new();
  for (path, name, bytecode) in contracts {
    let entry = by_path
      .entry(path.to_string())
      .or_insert_with(|| Value::Object(Default::default()));
    entry.as_object_mut().unwrap().insert(
      name.to_string(),
      json!({
        "abi": [{ "type": "function", "name": "owner", "inputs": [], "outputs": [] }],
        "evm": { "bytecode": { "object": bytecode }, "deployedBytecode": { "object": bytecode } },
        "metadata": "{}"
      }),
    );
  }

  json!({
    "_format": "hh-sol-build-info-1",
    "id": "0f",
    "solcVersion": "0.8.24",
    "solcLongVersion": "0.8.24+commit.e11b9ed9",
    "input": { "language": "Solidity", "sources": {} },
    "output": { "contracts": by_path }
  })
}
