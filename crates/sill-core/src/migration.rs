//! Migration records and filesystem discovery.
//!
//! One file per migration, named `<version>_<slug>.sql`. The version token is
//! everything up to the first `_`; the slug is display-only. File content is
//! an opaque sequence of SQL statements executed verbatim by the backend.

use std::{fs, path::Path};

use crate::{error::DiscoveryError, version::Version};

// ─── Migration ───────────────────────────────────────────────────────────────

/// An immutable, versioned unit of schema-changing SQL.
#[derive(Debug, Clone)]
pub struct Migration {
  pub version: Version,
  /// Display name taken from the filename slug.
  pub name:    String,
  /// Raw SQL, passed through to the engine without interpretation.
  pub sql:     String,
}

// ─── MigrationSet ────────────────────────────────────────────────────────────

/// All discovered migrations, strictly ordered by version.
#[derive(Debug)]
pub struct MigrationSet {
  migrations: Vec<Migration>,
}

impl MigrationSet {
  /// Discover migration files in `dir`.
  ///
  /// Regular files with a `.sql` extension participate; everything else
  /// (subdirectories, dotfiles, editor leftovers) is ignored. An empty
  /// directory yields an empty set — "nothing to do", not an error.
  pub fn discover(dir: &Path) -> Result<Self, DiscoveryError> {
    if !dir.is_dir() {
      return Err(DiscoveryError::MissingDirectory(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|source| {
      DiscoveryError::ReadDirectory { path: dir.to_path_buf(), source }
    })?;

    let mut migrations = Vec::new();
    for entry in entries {
      let entry = entry.map_err(|source| DiscoveryError::ReadDirectory {
        path: dir.to_path_buf(),
        source,
      })?;

      let path = entry.path();
      if !path.is_file()
        || path.extension().is_none_or(|ext| !ext.eq_ignore_ascii_case("sql"))
      {
        continue;
      }

      let file_name = entry.file_name().to_string_lossy().into_owned();
      let (version, name) = parse_file_name(&file_name)
        .ok_or_else(|| DiscoveryError::InvalidFilename(file_name.clone()))?;

      let sql = fs::read_to_string(&path)
        .map_err(|source| DiscoveryError::ReadFile { path, source })?;

      migrations.push(Migration { version, name, sql });
    }

    Self::from_migrations(migrations)
  }

  /// Build a set from already-parsed records, sorting and rejecting
  /// duplicates. Used by `discover` and by tests that bypass the filesystem.
  pub fn from_migrations(
    mut migrations: Vec<Migration>,
  ) -> Result<Self, DiscoveryError> {
    migrations.sort_by(|a, b| a.version.cmp(&b.version));

    // Numeric equality, not token equality: `007_a.sql` next to `7_b.sql`
    // is just as ambiguous as two literal `7`s.
    for pair in migrations.windows(2) {
      if pair[0].version.numerically_equal(&pair[1].version) {
        return Err(DiscoveryError::DuplicateVersion {
          version: pair[1].version.clone(),
          first:   pair[0].name.clone(),
          second:  pair[1].name.clone(),
        });
      }
    }

    Ok(Self { migrations })
  }

  /// The ordered subsequence strictly newer than `current`.
  ///
  /// Version comparison governs the pending set: a migration added later
  /// with a version below the ledger maximum is never applied.
  pub fn pending_after<'a>(
    &'a self,
    current: &Version,
  ) -> impl Iterator<Item = &'a Migration> {
    self.migrations.iter().filter(move |m| m.version > *current)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Migration> {
    self.migrations.iter()
  }

  pub fn len(&self) -> usize {
    self.migrations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.migrations.is_empty()
  }
}

// ─── Filename parsing ────────────────────────────────────────────────────────

/// Split `<version>_<slug>.sql` into its version token and slug.
///
/// Conservative by design: the token must be non-empty, start with an ASCII
/// digit, and contain only ASCII alphanumerics and `.`. Anything else fails
/// discovery loudly rather than sorting somewhere surprising.
fn parse_file_name(file_name: &str) -> Option<(Version, String)> {
  let stem = file_name.strip_suffix(".sql")?;
  let (token, slug) = stem.split_once('_')?;

  let mut chars = token.chars();
  if !chars.next()?.is_ascii_digit() {
    return None;
  }
  if !token.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
    return None;
  }

  Some((Version::new(token), slug.to_owned()))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::TempDir;

  use super::*;

  fn write(dir: &TempDir, name: &str, sql: &str) {
    fs::write(dir.path().join(name), sql).unwrap();
  }

  #[test]
  fn parses_version_and_slug() {
    let (version, slug) = parse_file_name("1000_init.sql").unwrap();
    assert_eq!(version.as_str(), "1000");
    assert_eq!(slug, "init");
  }

  #[test]
  fn slug_may_itself_contain_underscores() {
    let (version, slug) = parse_file_name("20240101_add_users_table.sql").unwrap();
    assert_eq!(version.as_str(), "20240101");
    assert_eq!(slug, "add_users_table");
  }

  #[test]
  fn rejects_filenames_without_version_prefix() {
    assert!(parse_file_name("init.sql").is_none());
    assert!(parse_file_name("_init.sql").is_none());
    assert!(parse_file_name("v1_init.sql").is_none());
    assert!(parse_file_name("10-00_init.sql").is_none());
    assert!(parse_file_name("1000_init.txt").is_none());
  }

  #[test]
  fn discovery_orders_by_version_not_name() {
    let dir = TempDir::new().unwrap();
    write(&dir, "10_second.sql", "-- b");
    write(&dir, "9_first.sql", "-- a");
    write(&dir, "1000_third.sql", "-- c");

    let set = MigrationSet::discover(dir.path()).unwrap();
    let names: Vec<_> = set.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["first", "second", "third"]);
  }

  #[test]
  fn discovery_ignores_non_sql_entries() {
    let dir = TempDir::new().unwrap();
    write(&dir, "1_init.sql", "-- a");
    write(&dir, "README.md", "docs");
    write(&dir, ".gitkeep", "");
    fs::create_dir(dir.path().join("archive")).unwrap();

    let set = MigrationSet::discover(dir.path()).unwrap();
    assert_eq!(set.len(), 1);
  }

  #[test]
  fn discovery_of_empty_directory_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let set = MigrationSet::discover(dir.path()).unwrap();
    assert!(set.is_empty());
  }

  #[test]
  fn discovery_of_missing_directory_errors() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    let err = MigrationSet::discover(&missing).unwrap_err();
    assert!(matches!(err, DiscoveryError::MissingDirectory(_)));
  }

  #[test]
  fn invalid_sql_filename_errors() {
    let dir = TempDir::new().unwrap();
    write(&dir, "1_init.sql", "-- a");
    write(&dir, "notes.sql", "-- not a migration");

    let err = MigrationSet::discover(dir.path()).unwrap_err();
    assert!(matches!(err, DiscoveryError::InvalidFilename(name) if name == "notes.sql"));
  }

  #[test]
  fn duplicate_versions_error() {
    let dir = TempDir::new().unwrap();
    write(&dir, "1000_a.sql", "-- a");
    write(&dir, "1000_b.sql", "-- b");

    let err = MigrationSet::discover(dir.path()).unwrap_err();
    assert!(matches!(err, DiscoveryError::DuplicateVersion { .. }));
  }

  #[test]
  fn width_variant_duplicates_error() {
    let dir = TempDir::new().unwrap();
    write(&dir, "007_a.sql", "-- a");
    write(&dir, "7_b.sql", "-- b");

    let err = MigrationSet::discover(dir.path()).unwrap_err();
    assert!(matches!(err, DiscoveryError::DuplicateVersion { .. }));
  }

  #[test]
  fn pending_after_filters_by_version_comparison() {
    let dir = TempDir::new().unwrap();
    write(&dir, "9_a.sql", "-- a");
    write(&dir, "10_b.sql", "-- b");
    write(&dir, "11_c.sql", "-- c");

    let set = MigrationSet::discover(dir.path()).unwrap();

    let pending: Vec<_> = set
      .pending_after(&Version::new("10"))
      .map(|m| m.name.as_str())
      .collect();
    assert_eq!(pending, ["c"]);

    let all: Vec<_> = set
      .pending_after(&Version::zero())
      .map(|m| m.name.as_str())
      .collect();
    assert_eq!(all, ["a", "b", "c"]);
  }
}
