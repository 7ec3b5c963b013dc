//! Constants shared across the crate.

/// Application name, used for platform directories.
pub const APP_NAME: &str = "abivault";

/// Length of an [`ArtifactId`](crate::util::hash::ArtifactId) in hex characters.
pub const ARTIFACT_ID_LEN: usize = 12;

/// Directory (or key segment) holding tag entries within a project.
pub const TAGS_DIR: &str = "tags";

/// Directory (or key segment) holding id entries within a project.
pub const IDS_DIR: &str = "ids";

/// File extension of stored artifact documents.
pub const ARTIFACT_EXT: &str = "json";

/// File name of a persisted summary document.
pub const SUMMARY_FILENAME: &str = "summary.json";

/// Default number of concurrent pull downloads.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default timeout for remote requests, in seconds.
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;
