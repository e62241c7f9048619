//! The `VersionStore` trait — the applied-version ledger contract.
//!
//! Implemented by storage backends (e.g. `sill-sqlite`). The applicator in
//! [`crate::apply`] depends on this abstraction, not on any concrete engine.

use crate::{migration::Migration, version::Version};

/// Abstraction over the ledger of applied migration versions inside a target
/// database.
///
/// The ledger is append-only from the trait's point of view: once a version
/// is recorded it is never removed or re-applied. Backends are free to store
/// it as one row per version or as a single current-version scalar, as long
/// as [`current_version`](VersionStore::current_version) reports the maximum
/// applied version.
pub trait VersionStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Idempotently create the ledger structure if absent.
  ///
  /// Must never fail merely because it has been called before.
  fn ensure_initialized(&mut self) -> Result<(), Self::Error>;

  /// The maximum applied version, or [`Version::zero`] if none has been
  /// applied (including when the ledger exists but is empty). Read-only.
  fn current_version(&mut self) -> Result<Version, Self::Error>;

  /// Every applied version, ascending. Read-only.
  fn applied_versions(&mut self) -> Result<Vec<Version>, Self::Error>;

  /// Execute the migration's SQL and record its version as applied, as a
  /// single atomic unit.
  ///
  /// On any failure the unit must roll back entirely: the database content
  /// and the ledger are left exactly as they were before the call.
  fn apply_migration(&mut self, migration: &Migration) -> Result<(), Self::Error>;
}
