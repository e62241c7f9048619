//! [`SqliteStore`] — the SQLite implementation of [`VersionStore`].

use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use sill_core::{Migration, Version, VersionStore};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An applied-version ledger backed by a single SQLite file.
///
/// The ledger is one table (name configurable) with one text-typed row per
/// applied version. Text typing is deliberate: timestamp identifiers exceed
/// what a 64-bit integer column can be trusted with across tools.
pub struct SqliteStore {
  conn:         Connection,
  ledger_table: String,
}

impl SqliteStore {
  /// Open an existing database file.
  ///
  /// Opens without `SQLITE_OPEN_CREATE`: a missing file is the caller's
  /// precondition error, never a silently created empty database.
  pub fn open(
    path: impl AsRef<Path>,
    ledger_table: impl Into<String>,
  ) -> Result<Self, rusqlite::Error> {
    let conn =
      Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;
    Ok(Self { conn, ledger_table: ledger_table.into() })
  }

  /// Open an in-memory store — useful for testing.
  pub fn open_in_memory(
    ledger_table: impl Into<String>,
  ) -> Result<Self, rusqlite::Error> {
    let conn = Connection::open_in_memory()?;
    Ok(Self { conn, ledger_table: ledger_table.into() })
  }

  pub fn ledger_table(&self) -> &str {
    &self.ledger_table
  }

  pub(crate) fn connection(&self) -> &Connection {
    &self.conn
  }

  fn ledger_ident(&self) -> String {
    quote_ident(&self.ledger_table)
  }

  /// Every ledger row, ascending under the version comparator. `&self`
  /// flavour used by the snapshotter after the mutable apply run is done.
  pub(crate) fn read_applied_versions(
    &self,
  ) -> Result<Vec<Version>, rusqlite::Error> {
    let sql = format!("SELECT version FROM {}", self.ledger_ident());
    let mut stmt = self.conn.prepare(&sql)?;
    let mut versions = stmt
      .query_map([], |row| row.get::<_, String>(0))?
      .map(|row| row.map(Version::new))
      .collect::<rusqlite::Result<Vec<_>>>()?;

    // Sorted in Rust under the version comparator — SQL `ORDER BY` (and SQL
    // `MAX`) would be lexicographic and mis-order tokens of differing width.
    versions.sort();
    Ok(versions)
  }
}

impl VersionStore for SqliteStore {
  type Error = rusqlite::Error;

  fn ensure_initialized(&mut self) -> Result<(), rusqlite::Error> {
    let sql = format!(
      "CREATE TABLE IF NOT EXISTS {} (version TEXT PRIMARY KEY)",
      self.ledger_ident()
    );
    self.conn.execute_batch(&sql)
  }

  fn current_version(&mut self) -> Result<Version, rusqlite::Error> {
    Ok(
      self
        .read_applied_versions()?
        .pop()
        .unwrap_or_else(Version::zero),
    )
  }

  fn applied_versions(&mut self) -> Result<Vec<Version>, rusqlite::Error> {
    self.read_applied_versions()
  }

  fn apply_migration(
    &mut self,
    migration: &Migration,
  ) -> Result<(), rusqlite::Error> {
    let record = format!(
      "INSERT INTO {} (version) VALUES (?1)",
      self.ledger_ident()
    );

    // One transaction per migration: the migration's own statements and the
    // ledger row commit together or not at all. Dropping an uncommitted
    // `Transaction` rolls it back.
    let tx = self.conn.transaction()?;
    tx.execute_batch(&migration.sql)?;
    tx.execute(&record, [migration.version.as_str()])?;
    tx.commit()
  }
}

// ─── Identifier quoting ──────────────────────────────────────────────────────

/// Double-quote an identifier. The ledger table name is configuration data,
/// not trusted SQL.
pub(crate) fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn quotes_plain_identifiers() {
    assert_eq!(quote_ident("schema_migrations"), "\"schema_migrations\"");
  }

  #[test]
  fn escapes_embedded_quotes() {
    assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
  }
}
