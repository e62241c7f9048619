//! Run configuration.
//!
//! Every entry point takes an explicit [`Config`]; nothing reads ambient
//! process state. The CLI is the only layer that knows about flags, env vars
//! and config files — it assembles one of these and hands it down.

use std::path::PathBuf;

/// Default name of the applied-version ledger table.
pub const DEFAULT_LEDGER_TABLE: &str = "schema_migrations";

/// Configuration for one apply run.
#[derive(Debug, Clone)]
pub struct Config {
  /// SQLite database file to migrate. Must already exist; an empty file is a
  /// valid empty database.
  pub database:       PathBuf,
  /// Directory holding `<version>_<slug>.sql` files.
  pub migrations_dir: PathBuf,
  /// Name of the applied-version ledger table inside the database.
  pub ledger_table:   String,
  /// Where to write the schema snapshot after a run that applied at least
  /// one migration. `None` disables snapshotting.
  pub snapshot_path:  Option<PathBuf>,
}

impl Config {
  /// A configuration with the default ledger table and no snapshot.
  pub fn new(
    database: impl Into<PathBuf>,
    migrations_dir: impl Into<PathBuf>,
  ) -> Self {
    Self {
      database:       database.into(),
      migrations_dir: migrations_dir.into(),
      ledger_table:   DEFAULT_LEDGER_TABLE.to_owned(),
      snapshot_path:  None,
    }
  }

  pub fn with_ledger_table(mut self, table: impl Into<String>) -> Self {
    self.ledger_table = table.into();
    self
  }

  pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.snapshot_path = Some(path.into());
    self
  }
}
