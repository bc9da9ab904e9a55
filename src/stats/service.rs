use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::event::{EventError, EventHandler, QuizEvent};

use super::{
    models::{AggregatedPlayerStat, GameStatistics},
    ranking::rank_players,
    repository::StatsRepository,
    StatsError,
};

/// Ranking of a channel
#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    pub games_played: usize,
    pub ranking: Vec<AggregatedPlayerStat>,
}

pub struct StatsService {
    repository: Arc<dyn StatsRepository>,
}

impl StatsService {
    pub fn new(repository: Arc<dyn StatsRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, game), fields(players = game.stats.len()))]
    pub async fn record_game(&self, channel_id: &str, game: GameStatistics) -> Result<(), StatsError> {
        self.repository.append_game(channel_id, game).await?;
        info!(channel_id = %channel_id, "Recorded finished game");
        Ok(())
    }

    pub async fn history(&self, channel_id: &str) -> Result<Vec<GameStatistics>, StatsError> {
        self.repository.load_games(channel_id).await
    }

    #[instrument(skip(self))]
    pub async fn leaderboard(&self, channel_id: &str) -> Result<Leaderboard, StatsError> {
        let history = self.repository.load_games(channel_id).await?;
        Ok(Leaderboard {
            games_played: history.len(),
            ranking: rank_players(&history),
        })
    }
}

/// Persists a channel's games as they finish
pub struct StatsRecorder {
    channel_id: String,
    stats_service: Arc<StatsService>,
}

impl StatsRecorder {
    pub fn new(channel_id: impl Into<String>, stats_service: Arc<StatsService>) -> Self {
        Self {
            channel_id: channel_id.into(),
            stats_service,
        }
    }
}

#[async_trait]
impl EventHandler for StatsRecorder {
    async fn handle(&self, event: &QuizEvent) -> Result<(), EventError> {
        if let QuizEvent::GameFinished { statistics, .. } = event {
            self.stats_service
                .record_game(&self.channel_id, statistics.clone())
                .await
                .map_err(|e| EventError::failed(e.to_string()))?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "StatsRecorder"
    }
}
