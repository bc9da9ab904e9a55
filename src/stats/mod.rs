pub mod ledger;
pub mod models;
pub mod ranking;
pub mod repository;
pub mod service;

mod errors;

pub use errors::StatsError;
pub use ledger::GuessRecord;
pub use models::*;
pub use ranking::{rank_players, MIN_GAMES_FOR_RANKING, RANKING_SIZE};
pub use repository::{InMemoryStatsRepository, JsonFileStatsRepository, StatsRepository};
pub use service::{Leaderboard, StatsRecorder, StatsService};
