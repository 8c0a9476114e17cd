use log::warn;
use std::collections::BTreeSet;
use std::fs;

use super::connection::JsonConnection;
use crate::storage::WriteOutcome;

/// Repository for `imported_seasons.json`, the set of season keys whose
/// JSON content has already been migrated into a database.
///
/// The file is only written while a database backend is active. Reads
/// are lenient (missing or corrupt file means "nothing imported yet")
/// and writes are best-effort: losing the marker file only means a
/// season gets re-checked on the next startup.
#[derive(Clone)]
pub struct ImportMarkerRepository {
    connection: JsonConnection,
}

impl ImportMarkerRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }

    /// Load the marker set. Missing file means empty.
    pub fn read(&self) -> BTreeSet<String> {
        let path = self.connection.markers_path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => return BTreeSet::new(),
        };
        match serde_json::from_str::<Vec<String>>(&contents) {
            Ok(seasons) => seasons.into_iter().collect(),
            Err(err) => {
                warn!("ignoring unreadable marker file {:?}: {}", path, err);
                BTreeSet::new()
            }
        }
    }

    /// Persist the marker set as a sorted array.
    pub fn write(&self, seasons: &BTreeSet<String>) -> WriteOutcome {
        let path = self.connection.markers_path();
        let seasons: Vec<&String> = seasons.iter().collect();
        let result = serde_json::to_string(&seasons)
            .map_err(anyhow::Error::from)
            .and_then(|contents| fs::write(&path, contents).map_err(anyhow::Error::from));
        match result {
            Ok(()) => WriteOutcome::Written,
            Err(err) => {
                warn!("marker file not written: {}", err);
                WriteOutcome::FailedLogged
            }
        }
    }
}
