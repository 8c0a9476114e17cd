use anyhow::Result;
use log::info;
use sqlx::any::AnyPoolOptions;
use sqlx::migrate::MigrateDatabase;
use sqlx::{AnyPool, Sqlite};
use std::path::Path;
use std::sync::Once;
use std::time::Duration;

/// How long to wait for the initial connection before demoting to
/// JSON-only mode.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

static INSTALL_DRIVERS: Once = Once::new();

fn install_drivers() {
    INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);
}

/// Error classifying a database URL.
#[derive(Debug, thiserror::Error)]
pub enum DbUrlError {
    #[error("unsupported database url scheme: {0}")]
    UnsupportedScheme(String),
}

/// SQL dialect behind the connection, derived from the URL scheme.
///
/// The dialect decides parameter-placeholder syntax and the DDL used to
/// bootstrap the `games` table; callers of the store never see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Sqlite,
    MySql,
    Postgres,
}

impl DbKind {
    /// Classify a connection URL by its scheme.
    pub fn from_url(url: &str) -> Result<Self, DbUrlError> {
        if url.starts_with("sqlite:") {
            Ok(DbKind::Sqlite)
        } else if url.starts_with("mysql:") || url.starts_with("mariadb:") {
            Ok(DbKind::MySql)
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Ok(DbKind::Postgres)
        } else {
            let scheme = url.split(':').next().unwrap_or(url);
            Err(DbUrlError::UnsupportedScheme(scheme.to_string()))
        }
    }

    /// Placeholder for the 1-based parameter `index` ("?" everywhere
    /// except Postgres, which numbers its parameters).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            DbKind::Postgres => format!("${}", index),
            DbKind::Sqlite | DbKind::MySql => "?".to_string(),
        }
    }

    /// Comma-separated placeholder list for `count` parameters starting
    /// at index 1.
    pub fn placeholders(self, count: usize) -> String {
        (1..=count)
            .map(|i| self.placeholder(i))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn create_table_sql(self) -> &'static str {
        match self {
            DbKind::Sqlite => {
                r#"
                CREATE TABLE IF NOT EXISTS games (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    season TEXT NOT NULL,
                    gameNumber TEXT,
                    date TEXT,
                    location TEXT,
                    transportation REAL,
                    food REAL,
                    gamePayment REAL,
                    paidStatus TEXT,
                    observations TEXT,
                    paymentDate TEXT,
                    UNIQUE(season, gameNumber)
                )
                "#
            }
            DbKind::MySql => {
                r#"
                CREATE TABLE IF NOT EXISTS games (
                    id BIGINT AUTO_INCREMENT PRIMARY KEY,
                    season VARCHAR(255) NOT NULL,
                    gameNumber VARCHAR(255),
                    date VARCHAR(255),
                    location VARCHAR(255),
                    transportation DOUBLE,
                    food DOUBLE,
                    gamePayment DOUBLE,
                    paidStatus VARCHAR(50),
                    observations TEXT,
                    paymentDate VARCHAR(255),
                    UNIQUE(season, gameNumber)
                )
                "#
            }
            DbKind::Postgres => {
                r#"
                CREATE TABLE IF NOT EXISTS games (
                    id BIGSERIAL PRIMARY KEY,
                    season TEXT NOT NULL,
                    gameNumber TEXT,
                    date TEXT,
                    location TEXT,
                    transportation DOUBLE PRECISION,
                    food DOUBLE PRECISION,
                    gamePayment DOUBLE PRECISION,
                    paidStatus TEXT,
                    observations TEXT,
                    paymentDate TEXT,
                    UNIQUE(season, gameNumber)
                )
                "#
            }
        }
    }
}

/// DbConnection manages the database pool and schema bootstrap.
#[derive(Clone)]
pub struct DbConnection {
    pool: AnyPool,
    kind: DbKind,
}

impl DbConnection {
    /// Open (creating if missing) a local SQLite database file.
    pub async fn open_sqlite_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        install_drivers();
        let url = format!("sqlite:{}", path.as_ref().display());
        if !Sqlite::database_exists(&url).await.unwrap_or(false) {
            Sqlite::create_database(&url).await?;
        }
        Self::connect(&url).await
    }

    /// Connect to a database by URL (sqlite, mysql or postgres scheme).
    pub async fn connect(url: &str) -> Result<Self> {
        install_drivers();
        let kind = DbKind::from_url(url)?;
        let pool = AnyPoolOptions::new()
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect(url)
            .await?;
        info!("connected to {:?} database", kind);
        Ok(Self { pool, kind })
    }

    /// Ensure the `games` table exists. Idempotent; a preexisting table
    /// with the legacy shorter schema is left as-is.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(self.kind.create_table_sql())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn kind(&self) -> DbKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn kind_is_derived_from_url_scheme() {
        assert_eq!(DbKind::from_url("sqlite:games.db").unwrap(), DbKind::Sqlite);
        assert_eq!(
            DbKind::from_url("mysql://user@host/db").unwrap(),
            DbKind::MySql
        );
        assert_eq!(
            DbKind::from_url("mariadb://user@host/db").unwrap(),
            DbKind::MySql
        );
        assert_eq!(
            DbKind::from_url("postgres://user@host/db").unwrap(),
            DbKind::Postgres
        );
        assert_eq!(
            DbKind::from_url("postgresql://user@host/db").unwrap(),
            DbKind::Postgres
        );
        assert!(DbKind::from_url("redis://host").is_err());
    }

    #[test]
    fn placeholder_style_matches_dialect() {
        assert_eq!(DbKind::Sqlite.placeholders(3), "?,?,?");
        assert_eq!(DbKind::MySql.placeholders(2), "?,?");
        assert_eq!(DbKind::Postgres.placeholders(3), "$1,$2,$3");
        assert_eq!(DbKind::Postgres.placeholder(7), "$7");
    }

    #[tokio::test]
    async fn open_sqlite_creates_database_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("games.db");
        let connection = DbConnection::open_sqlite_file(&path).await.unwrap();
        assert_eq!(connection.kind(), DbKind::Sqlite);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn ensure_schema_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let connection = DbConnection::open_sqlite_file(temp.path().join("games.db"))
            .await
            .unwrap();
        connection.ensure_schema().await.unwrap();
        connection.ensure_schema().await.unwrap();

        // Table usable after the double bootstrap.
        sqlx::query("SELECT COUNT(*) FROM games")
            .fetch_one(connection.pool())
            .await
            .unwrap();
    }
}
