use serde::{Deserialize, Serialize};

/// A single officiated game and its earnings breakdown.
///
/// Serialized field names are camelCase so the JSON files on disk keep the
/// historical format (`gameNumber`, `gamePayment`, ...). Monetary fields
/// default to zero when absent; the UI owns input validation (date format,
/// numeric parsing) before records reach the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Season key this game belongs to, e.g. "2025/2026"
    #[serde(default)]
    pub season: String,
    /// Identifier unique within a season
    pub game_number: String,
    /// Calendar date in YYYY-MM-DD form
    #[serde(default)]
    pub date: String,
    /// Free-text venue
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub transportation: f64,
    #[serde(default)]
    pub food: f64,
    #[serde(default)]
    pub game_payment: f64,
    /// Payment status, case-insensitive; canonical values are "Yes"/"No"
    #[serde(default)]
    pub paid_status: String,
    /// Optional free-text notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    /// Optional free-text date the payment arrived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
}

impl Game {
    /// Total amount earned for this game (transportation + food + payment).
    pub fn total(&self) -> f64 {
        self.transportation + self.food + self.game_payment
    }

    /// Whether the game has been paid ("Yes"/"yes"/"YES" all count).
    pub fn is_paid(&self) -> bool {
        self.paid_status.eq_ignore_ascii_case("yes")
    }

    /// Case-insensitive substring match against game number, location
    /// and date. The query is expected to already be lowercased.
    pub fn matches_query(&self, query_lower: &str) -> bool {
        self.game_number.to_lowercase().contains(query_lower)
            || self.location.to_lowercase().contains(query_lower)
            || self.date.to_lowercase().contains(query_lower)
    }
}

/// Season totals split by payment status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    /// Sum of totals over games already paid
    pub total_earnings: f64,
    /// Sum of totals over games still owed
    pub amount_left: f64,
    /// Number of games in the season
    pub games_count: usize,
}

impl SeasonSummary {
    /// Fold a set of games into a summary. Missing monetary fields have
    /// already been defaulted to zero at deserialization time.
    pub fn from_games<'a, I: IntoIterator<Item = &'a Game>>(games: I) -> Self {
        let mut summary = SeasonSummary::default();
        for game in games {
            if game.is_paid() {
                summary.total_earnings += game.total();
            } else {
                summary.amount_left += game.total();
            }
            summary.games_count += 1;
        }
        summary
    }
}

impl Default for SeasonSummary {
    fn default() -> Self {
        Self {
            total_earnings: 0.0,
            amount_left: 0.0,
            games_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(number: &str, paid: &str, amounts: (f64, f64, f64)) -> Game {
        Game {
            season: "2025/2026".to_string(),
            game_number: number.to_string(),
            date: "2025-09-01".to_string(),
            location: "Field A".to_string(),
            transportation: amounts.0,
            food: amounts.1,
            game_payment: amounts.2,
            paid_status: paid.to_string(),
            observations: None,
            payment_date: None,
        }
    }

    #[test]
    fn paid_status_is_case_insensitive() {
        assert!(game("1", "Yes", (0.0, 0.0, 0.0)).is_paid());
        assert!(game("1", "YES", (0.0, 0.0, 0.0)).is_paid());
        assert!(game("1", "yes", (0.0, 0.0, 0.0)).is_paid());
        assert!(!game("1", "No", (0.0, 0.0, 0.0)).is_paid());
        assert!(!game("1", "", (0.0, 0.0, 0.0)).is_paid());
        assert!(!game("1", "pending", (0.0, 0.0, 0.0)).is_paid());
    }

    #[test]
    fn summary_partitions_by_paid_status() {
        let games = vec![
            game("1", "Yes", (10.0, 5.0, 50.0)),
            game("2", "No", (2.0, 3.0, 40.0)),
            game("3", "yes", (0.0, 0.0, 30.0)),
        ];
        let summary = SeasonSummary::from_games(&games);
        assert_eq!(summary.total_earnings, 95.0);
        assert_eq!(summary.amount_left, 45.0);
        assert_eq!(summary.games_count, 3);

        let total: f64 = games.iter().map(Game::total).sum();
        assert_eq!(summary.total_earnings + summary.amount_left, total);
    }

    #[test]
    fn missing_fields_default_when_deserializing() {
        // Older season files only carry the fields the form knew about.
        let json = r#"{"gameNumber": "12", "date": "2024-10-05"}"#;
        let game: Game = serde_json::from_str(json).unwrap();
        assert_eq!(game.game_number, "12");
        assert_eq!(game.transportation, 0.0);
        assert_eq!(game.total(), 0.0);
        assert!(!game.is_paid());
        assert!(game.observations.is_none());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let value = serde_json::to_value(game("7", "No", (1.0, 2.0, 3.0))).unwrap();
        assert!(value.get("gameNumber").is_some());
        assert!(value.get("gamePayment").is_some());
        assert!(value.get("paidStatus").is_some());
        // Optional fields stay off the wire when unset.
        assert!(value.get("observations").is_none());
    }

    #[test]
    fn query_matching_covers_number_location_and_date() {
        let g = game("42", "No", (0.0, 0.0, 0.0));
        assert!(g.matches_query("42"));
        assert!(g.matches_query("field"));
        assert!(g.matches_query("2025-09"));
        assert!(!g.matches_query("stadium"));
    }
}
