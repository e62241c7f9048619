//! Full-run orchestration: preconditions → discovery → apply → snapshot.

use std::fs;

use tracing::{debug, info};

use sill_core::{ApplyOutcome, Config, MigrationSet, apply_pending};

use crate::{
  error::{Error, PreconditionError, SnapshotError},
  snapshot::Snapshotter,
  store::SqliteStore,
};

/// Apply all pending migrations to `config.database`, then snapshot.
///
/// Precondition violations fail fast with no mutation. Discovery errors abort
/// before any transaction opens. A failing migration rolls back atomically
/// and halts the run. The snapshot is written only when at least one
/// migration was applied and `config.snapshot_path` is set; a snapshot
/// failure is surfaced but the already-committed migrations stand.
///
/// There is no cross-process coordination here: run one `migrate` against a
/// database at a time. Concurrent invocations are guarded only by SQLite's
/// own file locking.
pub fn migrate(config: &Config) -> Result<ApplyOutcome, Error> {
  if !config.database.is_file() {
    return Err(
      PreconditionError::DatabaseMissing(config.database.clone()).into(),
    );
  }
  if !config.migrations_dir.is_dir() {
    return Err(
      PreconditionError::MigrationsDirMissing(config.migrations_dir.clone())
        .into(),
    );
  }

  let mut store = SqliteStore::open(&config.database, &config.ledger_table)
    .map_err(|source| PreconditionError::EngineUnavailable {
      path: config.database.clone(),
      source,
    })?;

  let set = MigrationSet::discover(&config.migrations_dir)?;
  debug!(
    count = set.len(),
    dir = %config.migrations_dir.display(),
    "discovered migrations"
  );

  let outcome = apply_pending(&mut store, &set)?;

  if outcome.applied_count() > 0 {
    if let Some(path) = &config.snapshot_path {
      let dump = Snapshotter::default()
        .snapshot(&store)
        .map_err(SnapshotError::Read)?;
      fs::write(path, dump).map_err(|source| SnapshotError::Write {
        path: path.clone(),
        source,
      })?;
      info!(path = %path.display(), "wrote schema snapshot");
    }
  }

  Ok(outcome)
}
