use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Counters of one player during one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStat {
    #[serde(deserialize_with = "player_id_from_any")]
    pub player_id: String,
    pub player_name: String,
    pub nb_guesses: u32,
    /// Rounds where the player's first guess was timed
    pub nb_samples_played: u32,
    pub nb_correct_guesses: u32,
    pub nb_skips: u32,
    /// Rounds won with the first guess
    pub nb_aces: u32,
    pub max_streak: u32,
    /// Mean seconds to the first guess, over `nb_samples_played`
    pub reaction_time: f64,
    /// Mean fuzzy score of correct guesses, over `nb_correct_guesses`
    pub precision: f64,
}

impl PlayerStat {
    pub fn new(player_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            player_name: player_name.into(),
            nb_guesses: 0,
            nb_samples_played: 0,
            nb_correct_guesses: 0,
            nb_skips: 0,
            nb_aces: 0,
            max_streak: 0,
            reaction_time: 0.0,
            precision: 0.0,
        }
    }
}

/// Player ids may be stored as JSON numbers
fn player_id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// Statistics of one game, as persisted in a channel's history file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStatistics {
    #[serde(with = "epoch_seconds")]
    pub started_at: DateTime<Utc>,
    /// Player id -> counters
    pub stats: BTreeMap<String, PlayerStat>,
}

impl GameStatistics {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            // Persisted with microsecond precision
            started_at: started_at.trunc_subsecs(6),
            stats: BTreeMap::new(),
        }
    }

    pub fn started_now() -> Self {
        Self::new(Utc::now())
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerStat> {
        self.stats.get(player_id)
    }
}

/// `DateTime<Utc>` as float seconds since the Unix epoch
mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        let seconds = value.timestamp_micros() as f64 / 1_000_000.0;
        serializer.serialize_f64(seconds)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        let micros = (seconds * 1_000_000.0).round() as i64;
        DateTime::from_timestamp_micros(micros)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", seconds)))
    }
}

/// Cross-game fold of one player's [`PlayerStat`]s
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPlayerStat {
    pub player_id: String,
    pub player_name: String,
    pub nb_games: u32,
    pub nb_guesses: u32,
    pub nb_samples_played: u32,
    pub nb_correct_guesses: u32,
    pub nb_skips: u32,
    pub nb_aces: u32,
    pub max_streak: u32,
    pub reaction_time: f64,
    pub precision: f64,
}

impl From<PlayerStat> for AggregatedPlayerStat {
    fn from(stat: PlayerStat) -> Self {
        Self {
            player_id: stat.player_id,
            player_name: stat.player_name,
            nb_games: 1,
            nb_guesses: stat.nb_guesses,
            nb_samples_played: stat.nb_samples_played,
            nb_correct_guesses: stat.nb_correct_guesses,
            nb_skips: stat.nb_skips,
            nb_aces: stat.nb_aces,
            max_streak: stat.max_streak,
            reaction_time: stat.reaction_time,
            precision: stat.precision,
        }
    }
}

impl AggregatedPlayerStat {
    /// Merge `self` with a more recent game's aggregate
    ///
    /// Identity comes from `other`, counters are summed and the means are
    /// re-weighted by their own denominators.
    pub fn combine(&self, other: &AggregatedPlayerStat) -> AggregatedPlayerStat {
        AggregatedPlayerStat {
            player_id: other.player_id.clone(),
            player_name: other.player_name.clone(),
            nb_games: self.nb_games + 1,
            nb_guesses: self.nb_guesses + other.nb_guesses,
            nb_samples_played: self.nb_samples_played + other.nb_samples_played,
            nb_correct_guesses: self.nb_correct_guesses + other.nb_correct_guesses,
            nb_skips: self.nb_skips + other.nb_skips,
            nb_aces: self.nb_aces + other.nb_aces,
            max_streak: self.max_streak.max(other.max_streak),
            reaction_time: weighted_mean(
                self.reaction_time,
                self.nb_samples_played,
                other.reaction_time,
                other.nb_samples_played,
            ),
            precision: weighted_mean(
                self.precision,
                self.nb_correct_guesses,
                other.precision,
                other.nb_correct_guesses,
            ),
        }
    }

    pub fn avg_correct_guesses_per_game(&self) -> f64 {
        ratio(self.nb_correct_guesses, self.nb_games)
    }

    /// Share of guesses that were correct, 0 without guesses
    pub fn correct_guesses_ratio(&self) -> f64 {
        ratio(self.nb_correct_guesses, self.nb_guesses)
    }
}

fn weighted_mean(a: f64, a_weight: u32, b: f64, b_weight: u32) -> f64 {
    let total = a_weight + b_weight;
    if total == 0 {
        return 0.0;
    }
    (a * a_weight as f64 + b * b_weight as f64) / total as f64
}

fn ratio(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
