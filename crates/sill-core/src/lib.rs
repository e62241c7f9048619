//! Core types and trait definitions for the sill migration runner.
//!
//! This crate is deliberately free of database dependencies. It knows what a
//! migration *is* (a versioned unit of SQL), how migration files are
//! discovered and ordered, and how an ordered set is applied against the
//! [`VersionStore`] contract — but not how any particular engine executes it.

pub mod apply;
pub mod config;
pub mod error;
pub mod migration;
pub mod store;
pub mod version;

pub use apply::{ApplyError, ApplyOutcome, apply_pending};
pub use config::Config;
pub use error::DiscoveryError;
pub use migration::{Migration, MigrationSet};
pub use store::VersionStore;
pub use version::Version;
