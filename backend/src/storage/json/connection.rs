use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

const SEASON_FILE_PREFIX: &str = "games_";
const SEASON_FILE_SUFFIX: &str = ".json";

/// JsonConnection manages the data directory layout and file naming for
/// the JSON backend.
///
/// The directory is an explicit constructor argument; the store never
/// derives it from the executable location or the environment.
#[derive(Clone)]
pub struct JsonConnection {
    data_dir: PathBuf,
}

impl JsonConnection {
    /// Create a connection rooted at `data_dir`, creating the directory
    /// if it does not exist yet.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)?;
        }
        Ok(Self { data_dir })
    }

    /// The data directory this connection operates on.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the per-season record file, e.g.
    /// `games_2025-2026.json` for season "2025/2026".
    pub fn season_file_path(&self, season: &str) -> PathBuf {
        let file_name = format!(
            "{}{}{}",
            SEASON_FILE_PREFIX,
            season.replace('/', "-"),
            SEASON_FILE_SUFFIX
        );
        self.data_dir.join(file_name)
    }

    /// Path of the consolidated cross-season export.
    pub fn all_games_path(&self) -> PathBuf {
        self.data_dir.join("all_games.json")
    }

    /// Path of the imported-season marker file.
    pub fn markers_path(&self) -> PathBuf {
        self.data_dir.join("imported_seasons.json")
    }

    /// Every season file currently on disk, as `(season key, path)`
    /// pairs sorted by file name. Unreadable directory entries are
    /// skipped.
    pub fn season_files(&self) -> Vec<(String, PathBuf)> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut seasons = Vec::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(season) = Self::season_from_file_name(name) {
                seasons.push((season, entry.path()));
            }
        }
        seasons.sort_by(|a, b| a.1.cmp(&b.1));
        seasons
    }

    /// Recover the season key from a season file name, undoing the
    /// slash-to-dash substitution. Returns `None` for unrelated files
    /// (including the derived `all_games.json`).
    fn season_from_file_name(name: &str) -> Option<String> {
        let stem = name
            .strip_prefix(SEASON_FILE_PREFIX)?
            .strip_suffix(SEASON_FILE_SUFFIX)?;
        if stem.is_empty() {
            return None;
        }
        Some(stem.replace('-', "/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_data_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join("data");
        let connection = JsonConnection::new(&dir).unwrap();
        assert!(dir.exists());
        assert_eq!(connection.data_dir(), dir.as_path());
    }

    #[test]
    fn season_file_name_replaces_slashes() {
        let temp = TempDir::new().unwrap();
        let connection = JsonConnection::new(temp.path()).unwrap();
        let path = connection.season_file_path("2025/2026");
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "games_2025-2026.json"
        );
    }

    #[test]
    fn season_files_skips_unrelated_files() {
        let temp = TempDir::new().unwrap();
        let connection = JsonConnection::new(temp.path()).unwrap();
        std::fs::write(connection.season_file_path("2024/2025"), "[]").unwrap();
        std::fs::write(connection.season_file_path("2025/2026"), "[]").unwrap();
        std::fs::write(connection.all_games_path(), "[]").unwrap();
        std::fs::write(connection.markers_path(), "[]").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "x").unwrap();

        let seasons: Vec<String> = connection
            .season_files()
            .into_iter()
            .map(|(season, _)| season)
            .collect();
        assert_eq!(seasons, vec!["2024/2025", "2025/2026"]);
    }
}
