//! `sill` — forward-only schema migrations for SQLite.
//!
//! # Usage
//!
//! ```
//! sill new add_users_table
//! sill apply --database app.db
//! sill --config sill.toml apply
//! ```
//!
//! `apply` never creates the database file; `touch app.db` bootstraps an
//! empty one.

use std::{
  fs,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use sill_core::{ApplyOutcome, Config, config::DEFAULT_LEDGER_TABLE};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sill", about = "Forward-only schema migrations for SQLite")]
struct Cli {
  /// Path to a TOML config file (database, migrations_dir, ledger_table,
  /// snapshot_path).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create a new migration placeholder with a fresh version identifier.
  New {
    /// Descriptive name; becomes the filename slug.
    name: String,

    /// Migrations directory (created if absent).
    #[arg(long, value_name = "DIR", env = "SILL_MIGRATIONS_DIR")]
    dir: Option<PathBuf>,
  },

  /// Apply all pending migrations, then write the schema snapshot.
  Apply {
    /// SQLite database file. Must already exist.
    #[arg(long, value_name = "FILE", env = "SILL_DATABASE")]
    database: Option<PathBuf>,

    /// Migrations directory.
    #[arg(long, value_name = "DIR", env = "SILL_MIGRATIONS_DIR")]
    dir: Option<PathBuf>,

    /// Name of the applied-version ledger table.
    #[arg(long, value_name = "NAME", env = "SILL_LEDGER_TABLE")]
    ledger_table: Option<String>,

    /// Where to write the schema snapshot.
    #[arg(long, value_name = "FILE", env = "SILL_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Skip writing the schema snapshot.
    #[arg(long, conflicts_with = "snapshot")]
    no_snapshot: bool,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file. Every field is optional; CLI flags
/// and `SILL_*` environment variables take precedence.
#[derive(Deserialize, Default)]
struct ConfigFile {
  database:       Option<PathBuf>,
  migrations_dir: Option<PathBuf>,
  ledger_table:   Option<String>,
  snapshot_path:  Option<PathBuf>,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let file_cfg: ConfigFile = if let Some(path) = &cli.config {
    let raw = fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  match cli.command {
    Command::New { name, dir } => {
      let dir = dir
        .or(file_cfg.migrations_dir)
        .unwrap_or_else(|| PathBuf::from("migrations"));
      create_migration(&dir, &name)
    }
    Command::Apply { database, dir, ledger_table, snapshot, no_snapshot } => {
      let database = database
        .or(file_cfg.database)
        .context("no database given (flag --database, env SILL_DATABASE, or config file)")?;
      let migrations_dir = dir
        .or(file_cfg.migrations_dir)
        .unwrap_or_else(|| PathBuf::from("migrations"));
      let ledger_table = ledger_table
        .or(file_cfg.ledger_table)
        .unwrap_or_else(|| DEFAULT_LEDGER_TABLE.to_owned());
      let snapshot_path = if no_snapshot {
        None
      } else {
        Some(
          snapshot
            .or(file_cfg.snapshot_path)
            .unwrap_or_else(|| PathBuf::from("schema.sql")),
        )
      };

      let config = Config {
        database,
        migrations_dir,
        ledger_table,
        snapshot_path,
      };
      apply(&config)
    }
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

fn apply(config: &Config) -> Result<()> {
  let outcome = sill_sqlite::migrate(config)
    .with_context(|| format!("migrating {}", config.database.display()))?;

  match outcome {
    ApplyOutcome::UpToDate { current } if current.is_zero() => {
      println!("already up to date (no migrations applied yet)");
    }
    ApplyOutcome::UpToDate { current } => {
      println!("already up to date (version {current})");
    }
    ApplyOutcome::Applied { applied, current } => {
      println!("applied {} migration(s), now at version {current}", applied.len());
    }
  }
  Ok(())
}

/// Write an empty migration file named `<UTC timestamp>_<slug>.sql`.
fn create_migration(dir: &Path, name: &str) -> Result<()> {
  let slug = slugify(name);
  if slug.is_empty() {
    bail!("migration name {name:?} has no usable characters");
  }

  fs::create_dir_all(dir)
    .with_context(|| format!("creating migrations directory {}", dir.display()))?;

  let version = Utc::now().format("%Y%m%d%H%M%S");
  let path = dir.join(format!("{version}_{slug}.sql"));
  if path.exists() {
    bail!("{} already exists; try again", path.display());
  }

  fs::write(&path, format!("-- migration: {slug}\n"))
    .with_context(|| format!("writing {}", path.display()))?;

  println!("created {}", path.display());
  Ok(())
}

/// Lowercase `name` and collapse every run of non-alphanumerics into one `_`.
fn slugify(name: &str) -> String {
  let mut slug = String::with_capacity(name.len());
  for c in name.chars() {
    if c.is_ascii_alphanumeric() {
      slug.push(c.to_ascii_lowercase());
    } else if !slug.ends_with('_') && !slug.is_empty() {
      slug.push('_');
    }
  }
  slug.trim_end_matches('_').to_owned()
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::slugify;

  #[test]
  fn slugs_are_lowercase_with_collapsed_separators() {
    assert_eq!(slugify("Add Users Table"), "add_users_table");
    assert_eq!(slugify("add--users!!table"), "add_users_table");
    assert_eq!(slugify("  leading and trailing  "), "leading_and_trailing");
  }

  #[test]
  fn slug_of_only_punctuation_is_empty() {
    assert_eq!(slugify("!!!"), "");
  }
}
