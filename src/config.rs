use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Tunables of a single game
#[derive(Debug, Clone)]
pub struct QuizConfig {
    /// Number of samples played per game
    pub nb_samples: usize,
    /// How long players have to guess a sample
    pub guess_time: Duration,
    /// Pause after a sample is resolved, before the next one
    pub cooldown: Duration,
    /// Cap on the points a combo can award for one guess
    pub max_combo: u32,
    /// Minimum fuzzy score for a guess to count as correct
    pub correct_threshold: f64,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            nb_samples: 12,
            guess_time: Duration::from_secs(30),
            cooldown: Duration::from_secs(3),
            max_combo: 2,
            correct_threshold: 0.8,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Process-level configuration, read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub stats_dir: PathBuf,
    pub catalog_path: PathBuf,
    /// Prefix addressing a command to the bot, e.g. "@MusicQuiz start"
    pub bot_mention: String,
    pub quiz: QuizConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut quiz = QuizConfig::default();

        if let Some(value) = lookup("NB_SAMPLES") {
            quiz.nb_samples = parse_number("NB_SAMPLES", &value)?;
        }
        if let Some(value) = lookup("GUESS_TIME_SECONDS") {
            quiz.guess_time = Duration::from_secs(parse_number("GUESS_TIME_SECONDS", &value)?);
        }

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            stats_dir: lookup("STATS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("stats")),
            catalog_path: lookup("CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("catalog.json")),
            bot_mention: lookup("BOT_MENTION").unwrap_or_else(|| "@MusicQuiz".to_string()),
            quiz,
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            name,
            value: value.to_string(),
        })
}
