//! Persistence layer for the simulation server.
//!
//! SQLite-backed launch log. The simulation itself stays in memory; the log is
//! written alongside launch, intercept and impact events.

pub mod db;
pub mod launches;

pub use db::{init_database, Database};
