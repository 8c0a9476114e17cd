//! One-time import of JSON-resident seasons into the database.
//!
//! Seasons already migrated are tracked in `imported_seasons.json` so
//! the JSON files (which stay on disk as backups) are not re-applied on
//! every startup. The marker alone is not trusted: it is global to the
//! data directory, so after switching database backends a marked season
//! can exist with zero rows in the new database. Such seasons are
//! re-imported.

use log::{info, warn};

use crate::storage::json::{ImportMarkerRepository, JsonGameRepository};
use crate::storage::sql::SqlGameRepository;
use crate::storage::GameStorage;

/// Import every not-yet-migrated season file into the database.
///
/// Failures are contained: an unreadable file imports as empty, a failed
/// season clear is logged and the inserts still run, and a failed insert
/// skips that record only. The marker file is persisted after each
/// season so an interrupted run does not redo completed seasons.
pub async fn import_json_seasons(
    sql: &SqlGameRepository,
    json: &JsonGameRepository,
    markers: &ImportMarkerRepository,
) {
    let mut imported = markers.read();

    for (season, _path) in json.connection().season_files() {
        if imported.contains(&season) {
            match sql.count_for_season(&season).await {
                Ok(count) if count > 0 => continue,
                Ok(_) => {
                    info!(
                        "season {} marked imported but has no rows; re-importing",
                        season
                    );
                }
                Err(err) => {
                    warn!(
                        "could not check rows for season {} ({}); attempting import",
                        season, err
                    );
                }
            }
        }

        let games = json.load_games(&season).await.unwrap_or_default();
        info!("importing {} games for season {}", games.len(), season);

        if let Err(err) = sql.clear_season(&season).await {
            warn!("could not clear season {} before import: {}", season, err);
            // inserts may still work; keep going
        }

        for game in &games {
            if let Err(err) = sql.add_game(&season, game).await {
                warn!(
                    "failed to import game {} of season {}: {}",
                    game.game_number, season, err
                );
            }
        }

        imported.insert(season);
        markers.write(&imported);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::json::test_utils::{sample_game, TestEnvironment};
    use crate::storage::json::JsonConnection;
    use crate::storage::sql::DbConnection;
    use tempfile::TempDir;

    struct Fixture {
        json: JsonGameRepository,
        markers: ImportMarkerRepository,
        _env: TestEnvironment,
    }

    impl Fixture {
        fn new() -> Self {
            let env = TestEnvironment::new().unwrap();
            let json = JsonGameRepository::new(env.connection.clone());
            let markers = ImportMarkerRepository::new(env.connection.clone());
            Self {
                json,
                markers,
                _env: env,
            }
        }

        fn connection(&self) -> &JsonConnection {
            self.json.connection()
        }
    }

    async fn sqlite_repo(temp: &TempDir) -> SqlGameRepository {
        let connection = DbConnection::open_sqlite_file(temp.path().join("games.db"))
            .await
            .unwrap();
        connection.ensure_schema().await.unwrap();
        SqlGameRepository::new(connection)
    }

    #[tokio::test]
    async fn imports_every_season_and_marks_them() {
        let fixture = Fixture::new();
        fixture
            .json
            .add_game("2024/2025", &sample_game("1"))
            .await
            .unwrap();
        fixture
            .json
            .add_game("2025/2026", &sample_game("1"))
            .await
            .unwrap();
        fixture
            .json
            .add_game("2025/2026", &sample_game("2"))
            .await
            .unwrap();

        let db_dir = TempDir::new().unwrap();
        let sql = sqlite_repo(&db_dir).await;
        import_json_seasons(&sql, &fixture.json, &fixture.markers).await;

        assert_eq!(sql.count_for_season("2024/2025").await.unwrap(), 1);
        assert_eq!(sql.count_for_season("2025/2026").await.unwrap(), 2);

        let imported = fixture.markers.read();
        assert!(imported.contains("2024/2025"));
        assert!(imported.contains("2025/2026"));

        // Imported content matches the file content.
        let games = sql.load_games("2025/2026").await.unwrap();
        let numbers: Vec<&str> = games.iter().map(|g| g.game_number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn running_twice_is_idempotent() {
        let fixture = Fixture::new();
        fixture
            .json
            .add_game("2025/2026", &sample_game("1"))
            .await
            .unwrap();

        let db_dir = TempDir::new().unwrap();
        let sql = sqlite_repo(&db_dir).await;
        import_json_seasons(&sql, &fixture.json, &fixture.markers).await;
        let first = sql.load_games("2025/2026").await.unwrap();

        import_json_seasons(&sql, &fixture.json, &fixture.markers).await;
        let second = sql.load_games("2025/2026").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn marked_and_populated_season_is_skipped() {
        let fixture = Fixture::new();
        fixture
            .json
            .add_game("2025/2026", &sample_game("1"))
            .await
            .unwrap();

        let db_dir = TempDir::new().unwrap();
        let sql = sqlite_repo(&db_dir).await;
        import_json_seasons(&sql, &fixture.json, &fixture.markers).await;

        // Change the file after migration: the database must win now.
        fixture
            .json
            .add_game("2025/2026", &sample_game("2"))
            .await
            .unwrap();
        import_json_seasons(&sql, &fixture.json, &fixture.markers).await;

        assert_eq!(sql.count_for_season("2025/2026").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn marked_but_empty_season_is_reimported() {
        let fixture = Fixture::new();
        fixture
            .json
            .add_game("2025/2026", &sample_game("1"))
            .await
            .unwrap();

        // Markers say imported, but this database (e.g. after a backend
        // switch) has never seen the season.
        let mut marked = std::collections::BTreeSet::new();
        marked.insert("2025/2026".to_string());
        fixture.markers.write(&marked);

        let db_dir = TempDir::new().unwrap();
        let sql = sqlite_repo(&db_dir).await;
        import_json_seasons(&sql, &fixture.json, &fixture.markers).await;

        assert_eq!(sql.count_for_season("2025/2026").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unreadable_season_file_imports_as_empty() {
        let fixture = Fixture::new();
        std::fs::write(
            fixture.connection().season_file_path("2025/2026"),
            "not json at all",
        )
        .unwrap();

        let db_dir = TempDir::new().unwrap();
        let sql = sqlite_repo(&db_dir).await;
        import_json_seasons(&sql, &fixture.json, &fixture.markers).await;

        assert_eq!(sql.count_for_season("2025/2026").await.unwrap(), 0);
        // The season is still marked; nothing was importable.
        assert!(fixture.markers.read().contains("2025/2026"));
    }
}
