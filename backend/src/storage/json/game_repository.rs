use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use std::fs;
use std::path::Path;

use shared::{Game, SeasonSummary};

use super::connection::JsonConnection;
use crate::storage::{GameStorage, WriteOutcome};

/// JSON-file game repository.
///
/// Every operation is read-all / write-all on the season's file, which is
/// fine at the scale of a referee's season (tens of games). Reads are
/// lenient: a missing or unreadable file behaves like an empty season.
/// Primary writes propagate their errors; backup and export writes are
/// best-effort and report a [`WriteOutcome`] instead.
#[derive(Clone)]
pub struct JsonGameRepository {
    connection: JsonConnection,
}

impl JsonGameRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &JsonConnection {
        &self.connection
    }

    /// Read a season file into records. Missing file means an empty
    /// season; a corrupt file is logged and treated the same way so a
    /// damaged backup never wedges the application.
    fn read_season(&self, season: &str) -> Vec<Game> {
        let path = self.connection.season_file_path(season);
        Self::read_games_file(&path)
    }

    fn read_games_file(path: &Path) -> Vec<Game> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str::<Vec<Game>>(&contents) {
            Ok(games) => games,
            Err(err) => {
                warn!("ignoring unreadable season file {:?}: {}", path, err);
                Vec::new()
            }
        }
    }

    /// Overwrite a season file. This is the strict write path: errors
    /// propagate to the caller.
    fn write_season(&self, season: &str, games: &[Game]) -> Result<()> {
        let path = self.connection.season_file_path(season);
        let contents = serde_json::to_string_pretty(games)?;
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Best-effort season backup, used as the write-through copy while a
    /// database backend is active.
    pub fn write_season_backup(&self, season: &str, games: &[Game]) -> WriteOutcome {
        match self.write_season(season, games) {
            Ok(()) => WriteOutcome::Written,
            Err(err) => {
                warn!("season backup for {} not written: {}", season, err);
                WriteOutcome::FailedLogged
            }
        }
    }

    /// Best-effort consolidated export (`all_games.json`).
    pub fn write_export(&self, games: &[Game]) -> WriteOutcome {
        let path = self.connection.all_games_path();
        let result = serde_json::to_string_pretty(games)
            .map_err(anyhow::Error::from)
            .and_then(|contents| fs::write(&path, contents).map_err(anyhow::Error::from));
        match result {
            Ok(()) => WriteOutcome::Written,
            Err(err) => {
                warn!("consolidated export not written: {}", err);
                WriteOutcome::FailedLogged
            }
        }
    }

    /// Stamp the season key onto a record so files always carry it even
    /// when the caller left the field blank.
    fn normalized(season: &str, game: &Game) -> Game {
        let mut game = game.clone();
        game.season = season.to_string();
        game
    }
}

#[async_trait]
impl GameStorage for JsonGameRepository {
    async fn load_games(&self, season: &str) -> Result<Vec<Game>> {
        Ok(self.read_season(season))
    }

    async fn save_games(&self, season: &str, games: &[Game]) -> Result<()> {
        let games: Vec<Game> = games.iter().map(|g| Self::normalized(season, g)).collect();
        self.write_season(season, &games)
    }

    async fn add_game(&self, season: &str, game: &Game) -> Result<()> {
        let mut games = self.read_season(season);
        // Upsert: an existing record with the same game number is
        // replaced, keeping the (season, gameNumber) key unique.
        games.retain(|existing| existing.game_number != game.game_number);
        games.push(Self::normalized(season, game));
        self.write_season(season, &games)
    }

    async fn update_game(&self, season: &str, game_number: &str, game: &Game) -> Result<()> {
        let mut games = self.read_season(season);
        if let Some(existing) = games
            .iter_mut()
            .find(|existing| existing.game_number == game_number)
        {
            let mut updated = game.clone();
            updated.season = season.to_string();
            updated.game_number = game_number.to_string();
            *existing = updated;
        }
        self.write_season(season, &games)
    }

    async fn delete_game(&self, season: &str, game_number: &str) -> Result<()> {
        let mut games = self.read_season(season);
        games.retain(|existing| existing.game_number != game_number);
        self.write_season(season, &games)
    }

    async fn search_games(&self, season: &str, query: &str) -> Result<Vec<Game>> {
        let query = query.to_lowercase();
        Ok(self
            .read_season(season)
            .into_iter()
            .filter(|game| game.matches_query(&query))
            .collect())
    }

    async fn summarize(&self, season: &str) -> Result<SeasonSummary> {
        Ok(SeasonSummary::from_games(&self.read_season(season)))
    }

    async fn load_all_games(&self) -> Result<Vec<Game>> {
        let mut all = Vec::new();
        for (_, path) in self.connection.season_files() {
            all.extend(Self::read_games_file(&path));
        }
        Ok(all)
    }
}
