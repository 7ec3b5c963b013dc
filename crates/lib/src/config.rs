//! Configuration.
//!
//! A [`Config`] is built once (file, then environment overrides) and passed by
//! reference to every operation.
//!
//! ```toml
//! root = "/var/lib/abivault"
//! concurrency = 8
//!
//! [remote]
//! url = "https://artifacts.example.com"
//! prefix = "team-a"
//! timeout_secs = 30
//! ```
//!
//! Environment overrides: `ABIVAULT_ROOT`, `ABIVAULT_REMOTE_URL`,
//! `ABIVAULT_REMOTE_TOKEN`. `ABIVAULT_CONFIG` names the config file.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{DEFAULT_CONCURRENCY, DEFAULT_REMOTE_TIMEOUT_SECS};
use crate::paths::{config_dir, data_dir};
use crate::storage::{LocalStorage, RemoteStorage, open_object_store};

pub const CONFIG_FILENAME: &str = "abivault.toml";

pub const ENV_CONFIG: &str = "ABIVAULT_CONFIG";
pub const ENV_ROOT: &str = "ABIVAULT_ROOT";
pub const ENV_REMOTE_URL: &str = "ABIVAULT_REMOTE_URL";
pub const ENV_REMOTE_TOKEN: &str = "ABIVAULT_REMOTE_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("config file not found: {0}")]
  NotFound(PathBuf),

  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid config: {0}")]
  Invalid(String),

  #[error("no remote configured (set `[remote] url` in abivault.toml or ABIVAULT_REMOTE_URL)")]
  NoRemote,
}

/// Remote bucket settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
  /// `http(s)://…`, `file://…` or a directory path.
  pub url: String,
  #[serde(default)]
  pub prefix: String,
  #[serde(default, skip_serializing)]
  pub token: Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
  DEFAULT_REMOTE_TIMEOUT_SECS
}

impl RemoteConfig {
  pub fn new(url: impl Into<String>) -> Self {
    Self {
      url: url.into(),
      prefix: String::new(),
      token: None,
      timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
    }
  }
}

/// On-disk shape; every field optional so defaults can be told apart.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
  root: Option<PathBuf>,
  concurrency: Option<usize>,
  remote: Option<RemoteConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
  /// Local store root.
  pub root: PathBuf,
  /// Maximum number of concurrent pull downloads.
  pub concurrency: usize,
  pub remote: Option<RemoteConfig>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      root: data_dir().join("artifacts"),
      concurrency: DEFAULT_CONCURRENCY,
      remote: None,
    }
  }
}

impl Config {
  /// Config with the given local root and defaults elsewhere.
  pub fn with_root(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      ..Self::default()
    }
  }

  /// Load configuration.
  ///
  /// Lookup order: `explicit`, `$ABIVAULT_CONFIG`, `./abivault.toml`,
  /// `<config dir>/config.toml`, built-in defaults. An explicitly named file
  /// must exist. Environment overrides are applied last.
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let named = explicit
      .map(Path::to_path_buf)
      .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from));

    let path = match named {
      Some(path) if path.is_file() => Some(path),
      Some(path) => return Err(ConfigError::NotFound(path)),
      None => [PathBuf::from(CONFIG_FILENAME), config_dir().join("config.toml")]
        .into_iter()
        .find(|p| p.is_file()),
    };

    let mut config = match path {
      Some(path) => {
        debug!(path = %path.display(), "loading config");
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
          path: path.clone(),
          source: e,
        })?;
        Self::from_toml(&content, &path)?
      }
      None => Self::default(),
    };

    config.apply_env();
    config.validate()?;
    Ok(config)
  }

  /// Parse a config document. A relative `root` is resolved against the
  /// directory containing `path`.
  pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
    let file: ConfigFile = toml::from_str(content).map_err(|e| ConfigError::Parse {
      path: path.to_path_buf(),
      source: e,
    })?;

    let mut config = Self::default();
    if let Some(root) = file.root {
      config.root = match path.parent() {
        Some(dir) if root.is_relative() => dir.join(root),
        _ => root,
      };
    }
    if let Some(concurrency) = file.concurrency {
      config.concurrency = concurrency;
    }
    config.remote = file.remote;
    config.validate()?;
    Ok(config)
  }

  fn apply_env(&mut self) {
    if let Some(root) = std::env::var_os(ENV_ROOT).filter(|v| !v.is_empty()) {
      self.root = PathBuf::from(root);
    }
    if let Ok(url) = std::env::var(ENV_REMOTE_URL)
      && !url.is_empty()
    {
      match &mut self.remote {
        Some(remote) => remote.url = url,
        None => self.remote = Some(RemoteConfig::new(url)),
      }
    }
    if let Ok(token) = std::env::var(ENV_REMOTE_TOKEN)
      && !token.is_empty()
      && let Some(remote) = &mut self.remote
    {
      remote.token = Some(token);
    }
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.concurrency == 0 {
      return Err(ConfigError::Invalid("concurrency must be at least 1".to_string()));
    }
    if let Some(remote) = &self.remote {
      if remote.url.trim().is_empty() {
        return Err(ConfigError::Invalid("remote.url must not be empty".to_string()));
      }
      if remote.timeout_secs == 0 {
        return Err(ConfigError::Invalid("remote.timeout_secs must be at least 1".to_string()));
      }
    }
    Ok(())
  }

  pub fn local_storage(&self) -> LocalStorage {
    LocalStorage::new(&self.root)
  }

  /// Open the configured remote store.
  pub fn remote_storage(&self) -> crate::Result<RemoteStorage> {
    let remote = self.remote.as_ref().ok_or(ConfigError::NoRemote)?;
    let store = open_object_store(
      &remote.url,
      remote.token.as_deref(),
      Duration::from_secs(remote.timeout_secs),
    )?;
    Ok(RemoteStorage::new(store, &remote.prefix))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  #[test]
  fn parse_full_document() {
    let toml = r#"
      root = "store"
      concurrency = 3

      [remote]
      url = "https://artifacts.example.com"
      prefix = "team-a"
    "#;
    let config = Config::from_toml(toml, Path::new("/etc/abivault/abivault.toml")).unwrap();
    assert_eq!(config.root, PathBuf::from("/etc/abivault/store"));
    assert_eq!(config.concurrency, 3);
    let remote = config.remote.unwrap();
    assert_eq!(remote.prefix, "team-a");
    assert_eq!(remote.timeout_secs, DEFAULT_REMOTE_TIMEOUT_SECS);
  }

  #[test]
  fn absolute_root_is_kept() {
    let config = Config::from_toml("root = \"/srv/artifacts\"", Path::new("/etc/abivault.toml")).unwrap();
    assert_eq!(config.root, PathBuf::from("/srv/artifacts"));
  }

  #[test]
  fn rejects_unknown_fields_and_bad_values() {
    let path = Path::new("abivault.toml");
    assert!(matches!(
      Config::from_toml("rooot = \"x\"", path),
      Err(ConfigError::Parse { .. })
    ));
    assert!(matches!(
      Config::from_toml("concurrency = 0", path),
      Err(ConfigError::Invalid(_))
    ));
    assert!(matches!(
      Config::from_toml("[remote]\nurl = \"\"", path),
      Err(ConfigError::Invalid(_))
    ));
  }

  #[test]
  #[serial]
  fn env_overrides_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("custom.toml");
    std::fs::write(&file, "root = \"/from/file\"\n[remote]\nurl = \"/bucket\"\n").unwrap();

    temp_env::with_vars(
      [
        (ENV_CONFIG, None::<&str>),
        (ENV_ROOT, Some("/from/env")),
        (ENV_REMOTE_URL, Some("https://remote.example.com")),
        (ENV_REMOTE_TOKEN, Some("t0k")),
      ],
      || {
        let config = Config::load(Some(&file)).unwrap();
        assert_eq!(config.root, PathBuf::from("/from/env"));
        let remote = config.remote.unwrap();
        assert_eq!(remote.url, "https://remote.example.com");
        assert_eq!(remote.token.as_deref(), Some("t0k"));
      },
    );
  }

  #[test]
  #[serial]
  fn empty_token_is_ignored() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("custom.toml");
    std::fs::write(&file, "[remote]\nurl = \"/bucket\"\n").unwrap();

    temp_env::with_vars(
      [
        (ENV_CONFIG, None::<&str>),
        (ENV_ROOT, None),
        (ENV_REMOTE_URL, None),
        (ENV_REMOTE_TOKEN, Some("")),
      ],
      || {
        let config = Config::load(Some(&file)).unwrap();
        assert_eq!(config.remote.unwrap().token, None);
      },
    );
  }

  #[test]
  #[serial]
  fn explicit_missing_file_is_an_error() {
    temp_env::with_vars([(ENV_CONFIG, None::<&str>)], || {
      let result = Config::load(Some(Path::new("/definitely/not/here.toml")));
      assert!(matches!(result, Err(ConfigError::NotFound(_))));
    });
  }

  #[test]
  fn remote_storage_requires_remote() {
    let config = Config::with_root("/tmp/x");
    assert!(matches!(
      config.remote_storage(),
      Err(crate::Error::Config(ConfigError::NoRemote))
    ));

    let mut config = Config::with_root("/tmp/x");
    config.remote = Some(RemoteConfig::new("memory://"));
    assert!(config.remote_storage().is_ok());
  }
}
