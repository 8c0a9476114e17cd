//! Test utilities for storage and store tests.
//!
//! Provides an RAII-scoped temporary data directory so test data is
//! removed even when a test panics.

use anyhow::Result;
use tempfile::TempDir;

use shared::Game;

use super::connection::JsonConnection;

/// Test environment holding a connection into a temporary data
/// directory that is deleted on drop.
pub struct TestEnvironment {
    pub connection: JsonConnection,
    _temp_dir: TempDir, // keep alive until the test finishes
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let connection = JsonConnection::new(temp_dir.path())?;
        Ok(Self {
            connection,
            _temp_dir: temp_dir,
        })
    }
}

/// A game matching the worked example used across the tests: 65.0 total,
/// not yet paid.
pub fn sample_game(game_number: &str) -> Game {
    Game {
        season: String::new(),
        game_number: game_number.to_string(),
        date: "2025-09-01".to_string(),
        location: "Field A".to_string(),
        transportation: 10.0,
        food: 5.0,
        game_payment: 50.0,
        paid_status: "No".to_string(),
        observations: None,
        payment_date: None,
    }
}
