//! # JSON Storage Module
//!
//! File-based storage backend. Each season lives in its own JSON file in
//! the data directory, with two derived files alongside:
//!
//! ```text
//! data/
//! ├── games_2024-2025.json      ← one array of records per season
//! ├── games_2025-2026.json
//! ├── all_games.json            ← consolidated export, always derived
//! └── imported_seasons.json     ← seasons already migrated to a database
//! ```
//!
//! Season keys contain slashes ("2025/2026"), so file names replace them
//! with dashes. This backend is both the standalone store when no
//! database is configured and the write-through backup when one is.

pub mod connection;
pub mod game_repository;
pub mod markers;

#[cfg(test)]
pub mod test_utils;

pub use connection::JsonConnection;
pub use game_repository::JsonGameRepository;
pub use markers::ImportMarkerRepository;
