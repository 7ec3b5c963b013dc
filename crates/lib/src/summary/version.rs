//! Release ordering.
//!
//! Release names that look like versions (`1`, `v1.2`, `v1.2.3`) are ordered
//! by version. Everything else (`latest`, `v1.2.3-rc.1`, untagged ids) is
//! opaque and sorts after every versioned release.

use std::cmp::Ordering;
use std::fmt;

use semver::Version;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseVersion {
  Ordered(Version),
  Opaque(String),
}

impl ReleaseVersion {
  /// Classify a release name.
  pub fn parse(name: &str) -> Self {
    match parse_version(name) {
      Some(version) => ReleaseVersion::Ordered(version),
      None => ReleaseVersion::Opaque(name.to_string()),
    }
  }

  pub fn is_ordered(&self) -> bool {
    matches!(self, ReleaseVersion::Ordered(_))
  }
}

/// An optional lowercase `v`, then one to three dot-separated integer
/// components. Missing components are zero.
fn parse_version(name: &str) -> Option<Version> {
  let bare = name.strip_prefix('v').unwrap_or(name);

  let parts: Vec<&str> = bare.split('.').collect();
  if parts.len() > 3 {
    return None;
  }

  let mut components = [0u64; 3];
  for (slot, part) in components.iter_mut().zip(&parts) {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
      return None;
    }
    *slot = part.parse().ok()?;
  }

  let [major, minor, patch] = components;
  Some(Version::new(major, minor, patch))
}

impl Ord for ReleaseVersion {
  fn cmp(&self, other: &Self) -> Ordering {
    match (self, other) {
      (ReleaseVersion::Ordered(a), ReleaseVersion::Ordered(b)) => a.cmp(b),
      (ReleaseVersion::Ordered(_), ReleaseVersion::Opaque(_)) => Ordering::Less,
      (ReleaseVersion::Opaque(_), ReleaseVersion::Ordered(_)) => Ordering::Greater,
      (ReleaseVersion::Opaque(a), ReleaseVersion::Opaque(b)) => a.cmp(b),
    }
  }
}

impl PartialOrd for ReleaseVersion {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl fmt::Display for ReleaseVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseVersion::Ordered(version) => write!(f, "{}", version),
      ReleaseVersion::Opaque(name) => write!(f, "{}", name),
    }
  }
}
