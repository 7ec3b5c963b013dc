//! abivault-lib: versioned storage and synchronization of compiled-contract artifacts
//!
//! Artifacts are immutable build outputs addressed by a short content digest
//! ([`util::hash::ArtifactId`]) and optionally by mutable per-project tags.
//! The crate provides:
//! - `storage`: local and remote stores with identical operations
//! - `pull` / `push`: synchronization and publishing
//! - `diff`: contract-level change detection
//! - `summary`: contract and release indices with version-aware deduplication

pub mod artifact;
pub mod config;
pub mod consts;
pub mod diff;
pub mod error;
pub mod paths;
pub mod pull;
pub mod push;
pub mod reference;
pub mod storage;
pub mod summary;
pub mod util;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use reference::{ArtifactKey, Reference};
pub use util::hash::ArtifactId;
