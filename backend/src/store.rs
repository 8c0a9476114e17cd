//! The [`GameStore`] façade: season-scoped CRUD and summaries over
//! whichever backend is available.
//!
//! The store is configured with a data directory and at most one
//! database backend. Database trouble never takes the application down:
//! a failed connection or schema bootstrap demotes the store to
//! JSON-only mode for its lifetime, with the reason kept in
//! [`GameStore::last_error`] so the UI can show a "using local files"
//! notice. While a database is active, the JSON files are maintained as
//! a write-through backup after every successful write.

use anyhow::Result;
use log::{error, warn};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use shared::{Game, SeasonSummary};

use crate::migration;
use crate::storage::json::{ImportMarkerRepository, JsonConnection, JsonGameRepository};
use crate::storage::sql::{DbConnection, SqlGameRepository};
use crate::storage::{GameStorage, WriteOutcome};

/// Database backend selection. Exactly one applies per store.
#[derive(Debug, Clone, Default)]
pub enum DatabaseBackend {
    /// JSON files only.
    #[default]
    None,
    /// Local embedded SQLite database file.
    SqliteFile(PathBuf),
    /// Connection URL (sqlite, mysql or postgres scheme).
    Url(String),
}

/// Store configuration. The data directory is always required; it holds
/// the season files, the consolidated export and the import markers.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub database: DatabaseBackend,
}

impl StoreConfig {
    /// JSON-only configuration.
    pub fn json_only<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            database: DatabaseBackend::None,
        }
    }
}

/// Persistence façade for game records.
pub struct GameStore {
    json: JsonGameRepository,
    markers: ImportMarkerRepository,
    sql: Option<SqlGameRepository>,
    db_error: Mutex<Option<String>>,
}

impl GameStore {
    /// Open a store from configuration.
    ///
    /// Fails only when the data directory cannot be created; any
    /// database problem is recorded and the store comes up JSON-only.
    /// With a usable connection this also runs the one-time JSON
    /// migration and a duplicate sweep, and regenerates the
    /// consolidated export either way.
    pub async fn open(config: StoreConfig) -> Result<Self> {
        let json_connection = JsonConnection::new(&config.data_dir)?;

        let (db, demotion) = match &config.database {
            DatabaseBackend::None => (None, Some("no database connection".to_string())),
            DatabaseBackend::SqliteFile(path) => {
                match DbConnection::open_sqlite_file(path).await {
                    Ok(connection) => (Some(connection), None),
                    Err(err) => {
                        error!("could not open database {:?}: {}", path, err);
                        (None, Some(err.to_string()))
                    }
                }
            }
            DatabaseBackend::Url(url) => match DbConnection::connect(url).await {
                Ok(connection) => (Some(connection), None),
                Err(err) => {
                    error!("could not connect to database: {}", err);
                    (None, Some(err.to_string()))
                }
            },
        };

        Self::init(json_connection, db, demotion).await
    }

    /// Open a store over a pre-established connection (e.g. one the UI
    /// dialog already tested). The schema bootstrap still runs and can
    /// still demote to JSON-only.
    pub async fn with_connection<P: AsRef<Path>>(
        data_dir: P,
        connection: DbConnection,
    ) -> Result<Self> {
        let json_connection = JsonConnection::new(data_dir)?;
        Self::init(json_connection, Some(connection), None).await
    }

    async fn init(
        json_connection: JsonConnection,
        db: Option<DbConnection>,
        mut demotion: Option<String>,
    ) -> Result<Self> {
        let json = JsonGameRepository::new(json_connection.clone());
        let markers = ImportMarkerRepository::new(json_connection);

        let mut sql = None;
        if let Some(db) = db {
            match db.ensure_schema().await {
                Ok(()) => sql = Some(SqlGameRepository::new(db)),
                Err(err) => {
                    // Connection is dropped here; JSON-only from now on.
                    error!("could not create games table: {}", err);
                    demotion = Some(err.to_string());
                }
            }
        }

        let store = Self {
            json,
            markers,
            sql,
            db_error: Mutex::new(demotion),
        };

        if let Some(sql) = &store.sql {
            migration::import_json_seasons(sql, &store.json, &store.markers).await;
            if let Err(err) = sql.dedupe().await {
                warn!("duplicate sweep failed: {}", err);
            }
        }
        store.regenerate_export().await;

        Ok(store)
    }

    /// Whether a database connection is active (false means JSON-only).
    pub fn has_connection(&self) -> bool {
        self.sql.is_some()
    }

    /// Most recent database diagnostic: `None` after a successful
    /// database operation, the failure message after a failed one, and
    /// the demotion reason while running on JSON files.
    pub fn last_error(&self) -> Option<String> {
        self.db_error.lock().unwrap().clone()
    }

    fn clear_error(&self) {
        *self.db_error.lock().unwrap() = None;
    }

    fn record_error(&self, context: &str, err: &anyhow::Error) {
        error!("{}: {}", context, err);
        *self.db_error.lock().unwrap() = Some(err.to_string());
    }

    /// All records for a season. Database read errors yield an empty
    /// list with the diagnostic set; check [`GameStore::last_error`] to
    /// tell "truly empty" from "backend failure".
    pub async fn load_games(&self, season: &str) -> Vec<Game> {
        match &self.sql {
            Some(sql) => match sql.load_games(season).await {
                Ok(games) => {
                    self.clear_error();
                    games
                }
                Err(err) => {
                    self.record_error("database read error", &err);
                    Vec::new()
                }
            },
            None => self.json.load_games(season).await.unwrap_or_default(),
        }
    }

    /// Replace the season's entire record set.
    pub async fn save_games(&self, season: &str, games: &[Game]) -> Result<()> {
        match &self.sql {
            Some(sql) => {
                if let Err(err) = sql.save_games(season, games).await {
                    self.record_error("database write error", &err);
                    return Err(err);
                }
                self.clear_error();
                self.backup_season(season).await;
                Ok(())
            }
            None => {
                self.json.save_games(season, games).await?;
                self.regenerate_export().await;
                Ok(())
            }
        }
    }

    /// Upsert a record by `(season, gameNumber)`.
    pub async fn add_game(&self, season: &str, game: &Game) -> Result<()> {
        match &self.sql {
            Some(sql) => {
                if let Err(err) = sql.add_game(season, game).await {
                    self.record_error("database write error", &err);
                    return Err(err);
                }
                self.clear_error();
                self.backup_season(season).await;
                Ok(())
            }
            None => {
                self.json.add_game(season, game).await?;
                self.regenerate_export().await;
                Ok(())
            }
        }
    }

    /// Update all mutable fields of the record matching
    /// `(season, gameNumber)`. No matching record is a no-op.
    pub async fn update_game(&self, season: &str, game_number: &str, game: &Game) -> Result<()> {
        match &self.sql {
            Some(sql) => {
                if let Err(err) = sql.update_game(season, game_number, game).await {
                    self.record_error("database write error", &err);
                    return Err(err);
                }
                self.clear_error();
                self.backup_season(season).await;
                Ok(())
            }
            None => {
                self.json.update_game(season, game_number, game).await?;
                self.regenerate_export().await;
                Ok(())
            }
        }
    }

    /// Delete the record matching `(season, gameNumber)`; idempotent.
    pub async fn delete_game(&self, season: &str, game_number: &str) -> Result<()> {
        match &self.sql {
            Some(sql) => {
                if let Err(err) = sql.delete_game(season, game_number).await {
                    self.record_error("database write error", &err);
                    return Err(err);
                }
                self.clear_error();
                self.backup_season(season).await;
                Ok(())
            }
            None => {
                self.json.delete_game(season, game_number).await?;
                self.regenerate_export().await;
                Ok(())
            }
        }
    }

    /// Case-insensitive substring search over game number, location and
    /// date within a season.
    pub async fn search_games(&self, season: &str, query: &str) -> Vec<Game> {
        match &self.sql {
            Some(sql) => match sql.search_games(season, query).await {
                Ok(games) => {
                    self.clear_error();
                    games
                }
                Err(err) => {
                    self.record_error("database search error", &err);
                    Vec::new()
                }
            },
            None => self
                .json
                .search_games(season, query)
                .await
                .unwrap_or_default(),
        }
    }

    /// Season totals split by paid status. Database errors yield a
    /// zeroed summary with the diagnostic set.
    pub async fn summarize(&self, season: &str) -> SeasonSummary {
        match &self.sql {
            Some(sql) => match sql.summarize(season).await {
                Ok(summary) => {
                    self.clear_error();
                    summary
                }
                Err(err) => {
                    self.record_error("database summary error", &err);
                    SeasonSummary::default()
                }
            },
            None => self.json.summarize(season).await.unwrap_or_default(),
        }
    }

    /// Refresh the season's JSON backup from current database state,
    /// then the consolidated export. Best-effort on every step.
    async fn backup_season(&self, season: &str) {
        if let Some(sql) = &self.sql {
            match sql.load_games(season).await {
                Ok(games) => {
                    self.json.write_season_backup(season, &games);
                }
                Err(err) => {
                    warn!("backup for season {} skipped: {}", season, err);
                }
            }
        }
        self.regenerate_export().await;
    }

    /// Rewrite `all_games.json` from the active backend.
    async fn regenerate_export(&self) -> WriteOutcome {
        let games = match &self.sql {
            Some(sql) => match sql.load_all_games().await {
                Ok(games) => games,
                Err(err) => {
                    warn!("consolidated export skipped: {}", err);
                    return WriteOutcome::FailedLogged;
                }
            },
            None => self.json.load_all_games().await.unwrap_or_default(),
        };
        self.json.write_export(&games)
    }
}
