//! # SQL Storage Module
//!
//! Relational storage backend over a sqlx `Any` pool. A single `games`
//! table holds every season, with a uniqueness constraint on
//! `(season, gameNumber)`. The connection knows which dialect it talks
//! to (SQLite file, MySQL, Postgres) and supplies the matching
//! placeholder syntax and DDL; nothing dialect-specific leaks past this
//! module.

pub mod connection;
pub mod game_repository;

pub use connection::{DbConnection, DbKind};
pub use game_repository::SqlGameRepository;
