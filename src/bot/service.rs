use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::QuizConfig,
    event::EventKind,
    game::{GameEngine, GameError, GameStatus, GameSummary},
    sample::SampleProvider,
    stats::{AggregatedPlayerStat, StatsError, StatsRecorder, StatsService},
    websockets::{ConnectionManager, MessageBroadcaster, WebSocketMessage},
};

use super::{
    announcer::ChannelAnnouncer,
    commands::{available_commands, is_chatter, parse_command, CommandType},
    table::{Heading, Table},
};

#[derive(Debug, Error)]
pub enum BotError {
    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("Failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Who sent a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub player_id: String,
    pub player_name: String,
}

impl Author {
    pub fn new(player_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            player_name: player_name.into(),
        }
    }
}

/// Chat front of the quiz: turns channel messages into commands, guesses
/// and skip votes, one game engine per channel
pub struct QuizBot {
    config: QuizConfig,
    mention: String,
    provider: Arc<dyn SampleProvider>,
    stats_service: Arc<StatsService>,
    connection_manager: Arc<dyn ConnectionManager>,
    engines: Arc<RwLock<HashMap<String, GameEngine>>>,
}

impl QuizBot {
    pub fn new(
        config: QuizConfig,
        mention: impl Into<String>,
        provider: Arc<dyn SampleProvider>,
        stats_service: Arc<StatsService>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            config,
            mention: mention.into(),
            provider,
            stats_service,
            connection_manager,
            engines: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Engine of a channel, while a game is played there
    pub async fn engine(&self, channel_id: &str) -> Option<GameEngine> {
        self.engines.read().await.get(channel_id).cloned()
    }

    async fn create_engine(&self, channel_id: &str) -> GameEngine {
        let engine = GameEngine::new(self.config.clone(), self.provider.clone());
        let announcer = ChannelAnnouncer::new(channel_id, self.connection_manager.clone());
        let recorder = StatsRecorder::new(channel_id, self.stats_service.clone());
        engine.events().subscribe_all(Arc::new(announcer)).await;
        engine
            .events()
            .subscribe(EventKind::GameFinished, Arc::new(recorder))
            .await;

        info!(channel_id = %channel_id, "Created game engine for channel");
        engine
    }

    /// Claim the channel's engine for a new game, creating it if needed
    async fn claim_engine(&self, channel_id: &str) -> Result<(GameEngine, Uuid), GameError> {
        let mut engines = self.engines.write().await;
        let engine = match engines.get(channel_id) {
            Some(engine) => engine.clone(),
            None => {
                let engine = self.create_engine(channel_id).await;
                engines.insert(channel_id.to_string(), engine.clone());
                engine
            }
        };

        let game_id = engine.begin().await?;
        Ok((engine, game_id))
    }

    async fn status(&self, channel_id: &str) -> GameStatus {
        match self.engine(channel_id).await {
            Some(engine) => engine.status().await,
            None => GameStatus::Idle,
        }
    }

    async fn send(&self, channel_id: &str, message: WebSocketMessage) -> Result<(), BotError> {
        MessageBroadcaster::broadcast_to_channel(&self.connection_manager, channel_id, &message).await?;
        Ok(())
    }

    /// Handle a chat message posted in a channel
    #[instrument(skip(self, author, content), fields(player_id = %author.player_id))]
    pub async fn handle_message(&self, channel_id: &str, author: &Author, content: &str) -> Result<(), BotError> {
        let command = match parse_command(content, &self.mention) {
            Ok(command) => command,
            Err(e) => {
                debug!(error = %e, "Rejected command");
                return self.send(channel_id, WebSocketMessage::error(e.to_string())).await;
            }
        };

        match command.map(|c| c.command_type) {
            Some(CommandType::Start) => {
                self.start_game(channel_id).await?;
                Ok(())
            }
            Some(CommandType::Help) => self.send(channel_id, WebSocketMessage::notice(available_commands())).await,
            Some(CommandType::Stats) => self.show_stats(channel_id).await,
            None => {
                self.handle_guess(channel_id, author, content).await;
                Ok(())
            }
        }
    }

    async fn handle_guess(&self, channel_id: &str, author: &Author, content: &str) {
        let guess = content.trim();
        if guess.is_empty() || is_chatter(guess) {
            return;
        }

        if let Some(engine) = self.engine(channel_id).await {
            if engine.status().await == GameStatus::WaitingForGuesses {
                engine
                    .handle_guess(&author.player_id, &author.player_name, guess)
                    .await;
            }
        }
    }

    /// Handle a vote to skip the current sample
    #[instrument(skip(self, author), fields(player_id = %author.player_id))]
    pub async fn handle_skip(&self, channel_id: &str, author: &Author) {
        if let Some(engine) = self.engine(channel_id).await {
            engine.vote_skip(&author.player_id, &author.player_name).await;
        }
    }

    /// Start a game in the background
    ///
    /// Returns `None`, after telling the channel, when a game is already
    /// running there.
    #[instrument(skip(self))]
    pub async fn start_game(
        &self,
        channel_id: &str,
    ) -> Result<Option<JoinHandle<Result<GameSummary, GameError>>>, BotError> {
        let (engine, game_id) = match self.claim_engine(channel_id).await {
            Ok(claimed) => claimed,
            Err(e) => {
                warn!(channel_id = %channel_id, error = %e, "Tried to start a game while one is running");
                self.send(
                    channel_id,
                    WebSocketMessage::notice("A game is already running in this channel!".to_string()),
                )
                .await?;
                return Ok(None);
            }
        };

        // The engine is already claimed, it must be played even if this notice fails
        if let Err(e) = self
            .send(
                channel_id,
                WebSocketMessage::notice("Get ready, a new game is about to start!".to_string()),
            )
            .await
        {
            warn!(channel_id = %channel_id, error = %e, "Failed to announce the game");
        }

        let connection_manager = self.connection_manager.clone();
        let engines = self.engines.clone();
        let channel = channel_id.to_string();

        let handle = tokio::spawn(async move {
            let result = engine.play(game_id).await;

            match &result {
                Ok(summary) => {
                    info!(channel_id = %channel, game_id = %summary.game_id, "Game completed");
                }
                Err(e) => {
                    error!(channel_id = %channel, error = %e, "Game aborted");
                    let message = WebSocketMessage::error(format!("The game was aborted: {}", e));
                    if let Err(e) = MessageBroadcaster::broadcast_to_channel(&connection_manager, &channel, &message).await {
                        warn!(channel_id = %channel, error = %e, "Failed to report game failure");
                    }
                }
            }

            retire_engine(&engines, &channel, &engine).await;
            result
        });

        Ok(Some(handle))
    }

    #[instrument(skip(self))]
    async fn show_stats(&self, channel_id: &str) -> Result<(), BotError> {
        if self.status(channel_id).await != GameStatus::Idle {
            return self
                .send(
                    channel_id,
                    WebSocketMessage::notice("Statistics are available once the current game is over.".to_string()),
                )
                .await;
        }

        let leaderboard = match self.stats_service.leaderboard(channel_id).await {
            Ok(leaderboard) => leaderboard,
            Err(e) => {
                error!(channel_id = %channel_id, error = %e, "Failed to load statistics");
                self.send(channel_id, WebSocketMessage::error(format!("Could not load statistics: {}", e)))
                    .await?;
                return Err(e.into());
            }
        };

        let text = if leaderboard.games_played == 0 {
            format!("No games played yet. Start a game with `{} start`!", self.mention)
        } else {
            format!("```\n{}```", render_ranking(&leaderboard.ranking))
        };

        self.send(
            channel_id,
            WebSocketMessage::stats(text, leaderboard.games_played, leaderboard.ranking),
        )
        .await
    }
}

/// Drop a channel's engine once its game is over
///
/// A newer game may have claimed the engine in the meantime, in which case it
/// stays until that game ends too.
async fn retire_engine(engines: &RwLock<HashMap<String, GameEngine>>, channel_id: &str, engine: &GameEngine) {
    let mut engines = engines.write().await;
    let current = engines
        .get(channel_id)
        .is_some_and(|current| current.same_game(engine));
    if current && engine.status().await == GameStatus::Idle {
        engines.remove(channel_id);
        debug!(channel_id = %channel_id, "Released game engine of channel");
    }
}

/// Ranking as a fixed-width table
pub fn render_ranking(ranking: &[AggregatedPlayerStat]) -> Table {
    let mut table = Table::new(vec![
        Heading::right("#"),
        Heading::new("Player"),
        Heading::right("Games"),
        Heading::right("Correct guesses"),
        Heading::right("Total guesses"),
        Heading::right("Ratio (%)"),
        Heading::right("Max streak"),
        Heading::right("Avg reaction time (s)"),
    ]);

    for (position, stat) in ranking.iter().enumerate() {
        table.add_row(vec![
            (position + 1).to_string(),
            stat.player_name.clone(),
            stat.nb_games.to_string(),
            stat.nb_correct_guesses.to_string(),
            stat.nb_guesses.to_string(),
            format!("{:.2}", stat.correct_guesses_ratio() * 100.0),
            stat.max_streak.to_string(),
            format!("{:.2}", stat.reaction_time),
        ]);
    }

    table
}
