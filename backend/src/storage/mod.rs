//! # Storage Module
//!
//! This module defines the storage abstraction both backends implement,
//! so the store façade can dispatch season-scoped operations without
//! knowing whether a SQL table or a directory of JSON files is behind
//! them.

use anyhow::Result;
use async_trait::async_trait;
use shared::{Game, SeasonSummary};

pub mod json;
pub mod sql;

/// Interface for season-scoped game storage operations.
///
/// Implemented by the JSON file repository and the SQL repository. The
/// uniqueness invariant on `(season, gameNumber)` is the implementor's
/// responsibility: `add_game` replaces any existing record with the same
/// key rather than erroring.
#[async_trait]
pub trait GameStorage: Send + Sync {
    /// Load every record for a season. Missing season means empty, not
    /// an error.
    async fn load_games(&self, season: &str) -> Result<Vec<Game>>;

    /// Replace the season's entire record set.
    async fn save_games(&self, season: &str, games: &[Game]) -> Result<()>;

    /// Upsert a record by `(season, gameNumber)`.
    async fn add_game(&self, season: &str, game: &Game) -> Result<()>;

    /// Update all mutable fields of the record matching
    /// `(season, gameNumber)`. Identity fields are left untouched; no
    /// matching record is a no-op.
    async fn update_game(&self, season: &str, game_number: &str, game: &Game) -> Result<()>;

    /// Delete the record matching `(season, gameNumber)`. Deleting an
    /// absent key is a no-op.
    async fn delete_game(&self, season: &str, game_number: &str) -> Result<()>;

    /// Case-insensitive substring search over game number, location and
    /// date within a season.
    async fn search_games(&self, season: &str, query: &str) -> Result<Vec<Game>>;

    /// Season totals split by paid status, plus the row count.
    async fn summarize(&self, season: &str) -> Result<SeasonSummary>;

    /// Every record across all seasons, for the consolidated export.
    async fn load_all_games(&self) -> Result<Vec<Game>>;
}

/// Outcome of a best-effort file write (backups, consolidated export).
///
/// These writes must never block a primary operation, so failures are
/// logged at the write site and reported as a value instead of an `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was written.
    Written,
    /// The write failed; a warning has been logged and the primary
    /// operation carries on.
    FailedLogged,
}

impl WriteOutcome {
    pub fn is_written(self) -> bool {
        matches!(self, WriteOutcome::Written)
    }
}
