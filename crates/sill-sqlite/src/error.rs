//! Error types for `sill-sqlite`.
//!
//! One variant class per failure mode of a run, so callers can tell
//! precondition violations from discovery problems from mid-transaction
//! failures from snapshot problems by matching.

use std::path::PathBuf;

use thiserror::Error;

use sill_core::{ApplyError, DiscoveryError};

/// A violated precondition. Surfaced immediately; nothing was mutated.
#[derive(Debug, Error)]
pub enum PreconditionError {
  /// The target database file must already exist (`touch` it to bootstrap an
  /// empty database); it is never created implicitly.
  #[error("database file does not exist: {}", .0.display())]
  DatabaseMissing(PathBuf),

  #[error("migrations directory does not exist: {}", .0.display())]
  MigrationsDirMissing(PathBuf),

  #[error("cannot open database {}: {source}", path.display())]
  EngineUnavailable {
    path:   PathBuf,
    source: rusqlite::Error,
  },
}

/// Snapshot generation failed after the migrations already committed.
///
/// The ledger is the source of truth; this never rolls anything back.
#[derive(Debug, Error)]
pub enum SnapshotError {
  #[error("reading schema from database: {0}")]
  Read(#[from] rusqlite::Error),

  #[error("writing schema snapshot to {}: {source}", path.display())]
  Write {
    path:   PathBuf,
    source: std::io::Error,
  },
}

/// Any failure of a full migration run.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Precondition(#[from] PreconditionError),

  #[error(transparent)]
  Discovery(#[from] DiscoveryError),

  #[error(transparent)]
  Apply(#[from] ApplyError<rusqlite::Error>),

  #[error(transparent)]
  Snapshot(#[from] SnapshotError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
