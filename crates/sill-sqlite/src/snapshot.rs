//! Schema snapshot generation.
//!
//! A snapshot is a UTF-8 dump of every *visible* schema object's defining
//! statement, followed by one ledger replay statement per applied version.
//! Replaying it against an empty database reproduces the visible schema and
//! marks the ledger fully applied. Output is byte-for-byte reproducible for a
//! fixed schema state: no timestamps, fixed object-kind order, bytewise name
//! order within a kind.
//!
//! Excluded from the visible set:
//! - engine-internal namespace objects (`sqlite_%`);
//! - shadow objects of virtual tables, which the engine recreates implicitly
//!   when the `CREATE VIRTUAL TABLE` statement is replayed.

use std::collections::{HashMap, HashSet};

use crate::store::{SqliteStore, quote_ident};

// ─── Shadow registry ─────────────────────────────────────────────────────────

/// Maps a virtual-table module to the name suffixes of its shadow objects.
///
/// A module declared as `CREATE VIRTUAL TABLE <base> USING <module>(...)`
/// creates internal objects named `<base>_<suffix>`; the registry enumerates
/// those suffixes per module. Kept as data rather than inline logic so
/// third-party modules can be registered without touching the snapshotter.
#[derive(Debug, Clone)]
pub struct ShadowRegistry {
  modules: HashMap<String, Vec<String>>,
}

impl Default for ShadowRegistry {
  /// The stock SQLite virtual-table modules.
  fn default() -> Self {
    let mut registry = Self { modules: HashMap::new() };
    registry.register("fts5", ["data", "idx", "content", "docsize", "config"]);
    registry
      .register("fts4", ["content", "segments", "segdir", "docsize", "stat"]);
    registry.register("fts3", ["content", "segments", "segdir"]);
    registry.register("rtree", ["node", "rowid", "parent"]);
    registry.register("rtree_i32", ["node", "rowid", "parent"]);
    registry.register("geopoly", ["node", "rowid", "parent"]);
    registry
  }
}

impl ShadowRegistry {
  /// An empty registry — nothing is treated as a shadow object.
  pub fn empty() -> Self {
    Self { modules: HashMap::new() }
  }

  /// Register (or replace) the shadow suffixes for a module.
  pub fn register<I, S>(&mut self, module: &str, suffixes: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.modules.insert(
      module.to_ascii_lowercase(),
      suffixes.into_iter().map(Into::into).collect(),
    );
  }

  fn suffixes(&self, module: &str) -> Option<&[String]> {
    self
      .modules
      .get(&module.to_ascii_lowercase())
      .map(Vec::as_slice)
  }
}

// ─── Snapshotter ─────────────────────────────────────────────────────────────

/// Produces the canonical schema dump for a migrated database.
#[derive(Debug, Clone, Default)]
pub struct Snapshotter {
  registry: ShadowRegistry,
}

struct SchemaObject {
  kind: String,
  name: String,
  sql:  String,
}

impl Snapshotter {
  pub fn new(registry: ShadowRegistry) -> Self {
    Self { registry }
  }

  /// Dump the visible schema plus ledger replay statements.
  pub fn snapshot(&self, store: &SqliteStore) -> Result<String, rusqlite::Error> {
    let conn = store.connection();

    let mut stmt = conn
      .prepare("SELECT type, name, sql FROM sqlite_master WHERE sql IS NOT NULL")?;
    let objects = stmt
      .query_map([], |row| {
        Ok(SchemaObject {
          kind: row.get(0)?,
          name: row.get(1)?,
          sql:  row.get(2)?,
        })
      })?
      .collect::<rusqlite::Result<Vec<_>>>()?;

    // Derive the shadow-object names of every virtual-table declaration.
    let mut shadows = HashSet::new();
    for object in &objects {
      if object.kind != "table" {
        continue;
      }
      let Some(module) = virtual_table_module(&object.sql) else {
        continue;
      };
      if let Some(suffixes) = self.registry.suffixes(&module) {
        for suffix in suffixes {
          shadows.insert(format!("{}_{}", object.name, suffix));
        }
      }
    }

    let mut visible: Vec<&SchemaObject> = objects
      .iter()
      .filter(|o| !o.name.starts_with("sqlite_"))
      .filter(|o| !shadows.contains(&o.name))
      .collect();
    visible.sort_by(|a, b| {
      kind_rank(&a.kind)
        .cmp(&kind_rank(&b.kind))
        .then_with(|| a.name.cmp(&b.name))
    });

    let mut out = String::new();
    for object in visible {
      out.push_str(object.sql.trim());
      out.push_str(";\n");
    }

    for version in store.read_applied_versions()? {
      out.push_str(&format!(
        "INSERT INTO {} (version) VALUES ('{}');\n",
        quote_ident(store.ledger_table()),
        version.as_str().replace('\'', "''"),
      ));
    }

    Ok(out)
  }
}

/// Fixed dump order: tables first (a virtual table is `type = 'table'`),
/// then indexes, triggers, views.
fn kind_rank(kind: &str) -> u8 {
  match kind {
    "table" => 0,
    "index" => 1,
    "trigger" => 2,
    "view" => 3,
    _ => 4,
  }
}

/// Extract the module name from a `CREATE VIRTUAL TABLE ... USING <module>`
/// statement, or `None` for ordinary tables.
fn virtual_table_module(sql: &str) -> Option<String> {
  let mut tokens = sql.split_whitespace();
  for expected in ["create", "virtual", "table"] {
    if !tokens.next()?.eq_ignore_ascii_case(expected) {
      return None;
    }
  }

  let mut module_token = None;
  while let Some(token) = tokens.next() {
    if token.eq_ignore_ascii_case("using") {
      module_token = tokens.next();
      break;
    }
  }

  let module: String = module_token?
    .chars()
    .take_while(|c| *c != '(' && *c != ';')
    .collect();
  let module = module.trim_matches(['"', '`', '\'']);
  (!module.is_empty()).then(|| module.to_ascii_lowercase())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ordinary_tables_have_no_module() {
    assert_eq!(virtual_table_module("CREATE TABLE t (id INTEGER)"), None);
    assert_eq!(virtual_table_module("CREATE INDEX i ON t(id)"), None);
  }

  #[test]
  fn extracts_module_with_and_without_spacing() {
    assert_eq!(
      virtual_table_module("CREATE VIRTUAL TABLE notes USING fts5(body)"),
      Some("fts5".into())
    );
    assert_eq!(
      virtual_table_module("create virtual table notes using FTS5 (body)"),
      Some("fts5".into())
    );
    assert_eq!(
      virtual_table_module(
        "CREATE VIRTUAL TABLE geo USING rtree(id, minx, maxx)"
      ),
      Some("rtree".into())
    );
  }

  #[test]
  fn registry_lookup_is_case_insensitive() {
    let registry = ShadowRegistry::default();
    assert!(registry.suffixes("FTS5").is_some());
    assert!(registry.suffixes("fts5").is_some());
    assert!(registry.suffixes("madeup").is_none());
  }

  #[test]
  fn registry_accepts_third_party_modules() {
    let mut registry = ShadowRegistry::empty();
    assert!(registry.suffixes("spellfix1").is_none());

    registry.register("spellfix1", ["vocab"]);
    assert_eq!(registry.suffixes("spellfix1"), Some(&["vocab".to_owned()][..]));
  }

  #[test]
  fn kind_order_is_tables_indexes_triggers_views() {
    let mut kinds = ["view", "trigger", "table", "index"];
    kinds.sort_by_key(|k| kind_rank(k));
    assert_eq!(kinds, ["table", "index", "trigger", "view"]);
  }
}
