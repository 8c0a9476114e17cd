//! # Game Log Backend
//!
//! Persistence core for the referee game log. The [`GameStore`] façade
//! exposes season-scoped CRUD and summary operations over one of two
//! backends:
//!
//! - a directory of per-season JSON files, or
//! - a relational `games` table (SQLite locally, MySQL/Postgres remote),
//!   with the JSON files maintained as a write-through backup.
//!
//! When a database connection becomes available, JSON-resident seasons are
//! migrated into the table exactly once, tracked by a marker file. The UI
//! layer consumes this crate directly; it supplies season keys and full
//! game records and reads [`GameStore::last_error`] to decide whether to
//! tell the user the app is running on local files.

pub mod migration;
pub mod storage;
pub mod store;

pub use shared::{Game, SeasonSummary};
pub use storage::sql::DbConnection;
pub use storage::WriteOutcome;
pub use store::{DatabaseBackend, GameStore, StoreConfig};
