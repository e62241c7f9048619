//! Error types for `sill-core`.

use std::path::PathBuf;

use thiserror::Error;

use crate::version::Version;

/// Failures while discovering and ordering migration files.
///
/// Any of these aborts the whole run before a transaction opens.
#[derive(Debug, Error)]
pub enum DiscoveryError {
  #[error("migrations directory does not exist: {}", .0.display())]
  MissingDirectory(PathBuf),

  #[error("reading migrations directory {}: {source}", path.display())]
  ReadDirectory {
    path:   PathBuf,
    source: std::io::Error,
  },

  /// A `.sql` file whose name does not parse as `<version>_<slug>.sql`.
  #[error("migration filename {0:?} has no valid version prefix")]
  InvalidFilename(String),

  #[error("reading migration file {}: {source}", path.display())]
  ReadFile {
    path:   PathBuf,
    source: std::io::Error,
  },

  /// Two files share a version identifier. Resolving this by sort order
  /// would silently pick one of them, so discovery fails instead.
  #[error("duplicate migration version {version}: {first:?} and {second:?}")]
  DuplicateVersion {
    version: Version,
    first:   String,
    second:  String,
  },
}
