use anyhow::Result;
use async_trait::async_trait;
use log::{info, warn};
use sqlx::any::AnyRow;
use sqlx::Row;
use std::collections::HashSet;

use shared::{Game, SeasonSummary};

use super::connection::DbConnection;
use crate::storage::GameStorage;

/// Column list shared by every SELECT/INSERT; decode order must match.
const GAME_COLUMNS: &str = "season, gameNumber, date, location, transportation, \
     food, gamePayment, paidStatus, observations, paymentDate";

/// SQL-backed game repository over the `games` table.
///
/// All statements are built with the connection's placeholder style so
/// the same code serves SQLite, MySQL and Postgres. Multi-statement
/// writes (upsert, season replace) run inside a single transaction.
#[derive(Clone)]
pub struct SqlGameRepository {
    connection: DbConnection,
}

impl SqlGameRepository {
    pub fn new(connection: DbConnection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &DbConnection {
        &self.connection
    }

    fn game_from_row(row: &AnyRow) -> Result<Game> {
        // Positional decode keeps us independent of identifier-case
        // folding differences between dialects.
        Ok(Game {
            season: row.try_get::<Option<String>, _>(0)?.unwrap_or_default(),
            game_number: row.try_get::<Option<String>, _>(1)?.unwrap_or_default(),
            date: row.try_get::<Option<String>, _>(2)?.unwrap_or_default(),
            location: row.try_get::<Option<String>, _>(3)?.unwrap_or_default(),
            transportation: row.try_get::<Option<f64>, _>(4)?.unwrap_or(0.0),
            food: row.try_get::<Option<f64>, _>(5)?.unwrap_or(0.0),
            game_payment: row.try_get::<Option<f64>, _>(6)?.unwrap_or(0.0),
            paid_status: row.try_get::<Option<String>, _>(7)?.unwrap_or_default(),
            observations: row.try_get::<Option<String>, _>(8)?,
            payment_date: row.try_get::<Option<String>, _>(9)?,
        })
    }

    fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO games({}) VALUES ({})",
            GAME_COLUMNS,
            self.connection.kind().placeholders(10)
        )
    }

    /// Number of rows stored for a season. Used by migration to decide
    /// whether a marked season needs a self-healing re-import.
    pub async fn count_for_season(&self, season: &str) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM games WHERE season = {}",
            self.connection.kind().placeholder(1)
        );
        let row = sqlx::query(&sql)
            .bind(season)
            .fetch_one(self.connection.pool())
            .await?;
        Ok(row.try_get::<i64, _>(0)?)
    }

    /// Delete every row for a season. Returns the number of rows
    /// removed.
    pub async fn clear_season(&self, season: &str) -> Result<u64> {
        let sql = format!(
            "DELETE FROM games WHERE season = {}",
            self.connection.kind().placeholder(1)
        );
        let result = sqlx::query(&sql)
            .bind(season)
            .execute(self.connection.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// Remove rows whose `(season, gameNumber)` repeats an earlier row,
    /// keeping the first of each key. The unique index prevents new
    /// duplicates, but a table written before the index existed (or by
    /// hand) may still carry them. Returns the number of rows removed.
    pub async fn dedupe(&self) -> Result<u64> {
        let rows = sqlx::query("SELECT id, season, gameNumber FROM games ORDER BY id")
            .fetch_all(self.connection.pool())
            .await?;

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut to_delete: Vec<i64> = Vec::new();
        for row in &rows {
            let id = row.try_get::<i64, _>(0)?;
            let season = row.try_get::<Option<String>, _>(1)?.unwrap_or_default();
            let game_number = row.try_get::<Option<String>, _>(2)?.unwrap_or_default();
            if !seen.insert((season, game_number)) {
                to_delete.push(id);
            }
        }

        let delete_sql = format!(
            "DELETE FROM games WHERE id = {}",
            self.connection.kind().placeholder(1)
        );
        let mut removed = 0u64;
        for id in to_delete {
            match sqlx::query(&delete_sql)
                .bind(id)
                .execute(self.connection.pool())
                .await
            {
                Ok(result) => removed += result.rows_affected(),
                Err(err) => warn!("could not remove duplicate row {}: {}", id, err),
            }
        }
        if removed > 0 {
            info!("removed {} duplicate game rows", removed);
        }
        Ok(removed)
    }
}

#[async_trait]
impl GameStorage for SqlGameRepository {
    async fn load_games(&self, season: &str) -> Result<Vec<Game>> {
        let sql = format!(
            "SELECT {} FROM games WHERE season = {} ORDER BY id",
            GAME_COLUMNS,
            self.connection.kind().placeholder(1)
        );
        let rows = sqlx::query(&sql)
            .bind(season)
            .fetch_all(self.connection.pool())
            .await?;
        rows.iter().map(Self::game_from_row).collect()
    }

    async fn save_games(&self, season: &str, games: &[Game]) -> Result<()> {
        // Replace the season atomically; a crash can no longer land
        // between the delete and the re-insert.
        let kind = self.connection.kind();
        let delete_sql = format!("DELETE FROM games WHERE season = {}", kind.placeholder(1));
        let insert_sql = self.insert_sql();

        let mut tx = self.connection.pool().begin().await?;
        sqlx::query(&delete_sql)
            .bind(season)
            .execute(&mut *tx)
            .await?;
        for game in games {
            sqlx::query(&insert_sql)
                .bind(season)
                .bind(&game.game_number)
                .bind(&game.date)
                .bind(&game.location)
                .bind(game.transportation)
                .bind(game.food)
                .bind(game.game_payment)
                .bind(&game.paid_status)
                .bind(game.observations.clone())
                .bind(game.payment_date.clone())
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn add_game(&self, season: &str, game: &Game) -> Result<()> {
        // Clear any row holding the key first, so the upsert never trips
        // the unique index.
        let kind = self.connection.kind();
        let delete_sql = format!(
            "DELETE FROM games WHERE season = {} AND gameNumber = {}",
            kind.placeholder(1),
            kind.placeholder(2)
        );
        let insert_sql = self.insert_sql();

        let mut tx = self.connection.pool().begin().await?;
        sqlx::query(&delete_sql)
            .bind(season)
            .bind(&game.game_number)
            .execute(&mut *tx)
            .await?;
        sqlx::query(&insert_sql)
            .bind(season)
            .bind(&game.game_number)
            .bind(&game.date)
            .bind(&game.location)
            .bind(game.transportation)
            .bind(game.food)
            .bind(game.game_payment)
            .bind(&game.paid_status)
            .bind(game.observations.clone())
            .bind(game.payment_date.clone())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_game(&self, season: &str, game_number: &str, game: &Game) -> Result<()> {
        let kind = self.connection.kind();
        let sql = format!(
            "UPDATE games SET date = {}, location = {}, transportation = {}, \
             food = {}, gamePayment = {}, paidStatus = {}, observations = {}, \
             paymentDate = {} WHERE season = {} AND gameNumber = {}",
            kind.placeholder(1),
            kind.placeholder(2),
            kind.placeholder(3),
            kind.placeholder(4),
            kind.placeholder(5),
            kind.placeholder(6),
            kind.placeholder(7),
            kind.placeholder(8),
            kind.placeholder(9),
            kind.placeholder(10),
        );
        // Zero rows affected means no such game; not an error.
        sqlx::query(&sql)
            .bind(&game.date)
            .bind(&game.location)
            .bind(game.transportation)
            .bind(game.food)
            .bind(game.game_payment)
            .bind(&game.paid_status)
            .bind(game.observations.clone())
            .bind(game.payment_date.clone())
            .bind(season)
            .bind(game_number)
            .execute(self.connection.pool())
            .await?;
        Ok(())
    }

    async fn delete_game(&self, season: &str, game_number: &str) -> Result<()> {
        let kind = self.connection.kind();
        let sql = format!(
            "DELETE FROM games WHERE season = {} AND gameNumber = {}",
            kind.placeholder(1),
            kind.placeholder(2)
        );
        sqlx::query(&sql)
            .bind(season)
            .bind(game_number)
            .execute(self.connection.pool())
            .await?;
        Ok(())
    }

    async fn search_games(&self, season: &str, query: &str) -> Result<Vec<Game>> {
        // LOWER on both sides: plain LIKE is case-sensitive on Postgres.
        let kind = self.connection.kind();
        let sql = format!(
            "SELECT {} FROM games WHERE season = {} AND \
             (LOWER(gameNumber) LIKE {} OR LOWER(location) LIKE {} OR LOWER(date) LIKE {}) \
             ORDER BY id",
            GAME_COLUMNS,
            kind.placeholder(1),
            kind.placeholder(2),
            kind.placeholder(3),
            kind.placeholder(4),
        );
        let like = format!("%{}%", query.to_lowercase());
        let rows = sqlx::query(&sql)
            .bind(season)
            .bind(&like)
            .bind(&like)
            .bind(&like)
            .fetch_all(self.connection.pool())
            .await?;
        rows.iter().map(Self::game_from_row).collect()
    }

    async fn summarize(&self, season: &str) -> Result<SeasonSummary> {
        let sql = format!(
            "SELECT transportation, food, gamePayment, paidStatus FROM games WHERE season = {}",
            self.connection.kind().placeholder(1)
        );
        let rows = sqlx::query(&sql)
            .bind(season)
            .fetch_all(self.connection.pool())
            .await?;

        let mut summary = SeasonSummary::default();
        for row in &rows {
            let total = row.try_get::<Option<f64>, _>(0)?.unwrap_or(0.0)
                + row.try_get::<Option<f64>, _>(1)?.unwrap_or(0.0)
                + row.try_get::<Option<f64>, _>(2)?.unwrap_or(0.0);
            let paid = row
                .try_get::<Option<String>, _>(3)?
                .map(|status| status.eq_ignore_ascii_case("yes"))
                .unwrap_or(false);
            if paid {
                summary.total_earnings += total;
            } else {
                summary.amount_left += total;
            }
        }
        summary.games_count = rows.len();
        Ok(summary)
    }

    async fn load_all_games(&self) -> Result<Vec<Game>> {
        let sql = format!("SELECT {} FROM games ORDER BY id", GAME_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(self.connection.pool())
            .await?;
        rows.iter().map(Self::game_from_row).collect()
    }
}
