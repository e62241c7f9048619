//! SQLite backend for the sill migration runner.
//!
//! Implements the [`sill_core::VersionStore`] contract over an in-process
//! [`rusqlite`] connection with real transaction objects, and provides the
//! [`migrate`] entry point that runs precondition checks, applies pending
//! migrations and writes the schema snapshot.

mod runner;
mod snapshot;
mod store;

pub mod error;

pub use error::{Error, PreconditionError, Result, SnapshotError};
pub use runner::migrate;
pub use snapshot::{ShadowRegistry, Snapshotter};
pub use store::SqliteStore;
