//! The applicator: applies the pending subsequence of a migration set.
//!
//! Drives a [`VersionStore`] through `ComputingPending → Applying(i) →
//! Completed | Failed(version)`. Migrations are assumed non-idempotent, so a
//! failure is a hard stop — never a retry.

use thiserror::Error;
use tracing::{debug, info};

use crate::{
  migration::{Migration, MigrationSet},
  store::VersionStore,
  version::Version,
};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Terminal state of a successful apply run.
///
/// "Nothing was pending" and "N migrations ran" are distinct non-error
/// outcomes; callers snapshot only after the latter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
  /// Every discovered migration was already recorded in the ledger.
  UpToDate { current: Version },
  /// `applied` ran in ascending order; `current` is the new ledger maximum.
  Applied {
    applied: Vec<Version>,
    current: Version,
  },
}

impl ApplyOutcome {
  pub fn applied_count(&self) -> usize {
    match self {
      Self::UpToDate { .. } => 0,
      Self::Applied { applied, .. } => applied.len(),
    }
  }

  pub fn current(&self) -> &Version {
    match self {
      Self::UpToDate { current } | Self::Applied { current, .. } => current,
    }
  }
}

// ─── Error ───────────────────────────────────────────────────────────────────

/// Failure during an apply run, parameterised over the backend error.
#[derive(Debug, Error)]
pub enum ApplyError<E: std::error::Error> {
  /// The ledger could not be initialised or read; no migration was attempted.
  #[error("version ledger unavailable: {0}")]
  Ledger(#[source] E),

  /// A migration's transaction failed and was rolled back. Everything before
  /// `version` is committed; everything from it on is unapplied.
  #[error("migration {version} ({name}) failed: {source}")]
  Execution {
    version: Version,
    name:    String,
    #[source]
    source:  E,
  },
}

// ─── Applicator ──────────────────────────────────────────────────────────────

/// Apply every migration in `set` newer than the ledger's current version.
///
/// Each pending migration runs inside its own atomic unit via
/// [`VersionStore::apply_migration`]; on the first failure the run halts with
/// the ledger still reporting the last successful version.
pub fn apply_pending<S: VersionStore>(
  store: &mut S,
  set: &MigrationSet,
) -> Result<ApplyOutcome, ApplyError<S::Error>> {
  store.ensure_initialized().map_err(ApplyError::Ledger)?;
  let mut current = store.current_version().map_err(ApplyError::Ledger)?;

  let pending: Vec<&Migration> = set.pending_after(&current).collect();
  if pending.is_empty() {
    debug!(current = %current, "ledger already up to date");
    return Ok(ApplyOutcome::UpToDate { current });
  }

  let mut applied = Vec::with_capacity(pending.len());
  for migration in pending {
    store.apply_migration(migration).map_err(|source| {
      ApplyError::Execution {
        version: migration.version.clone(),
        name: migration.name.clone(),
        source,
      }
    })?;

    info!(version = %migration.version, name = %migration.name, "applied migration");
    current = migration.version.clone();
    applied.push(migration.version.clone());
  }

  Ok(ApplyOutcome::Applied { applied, current })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
