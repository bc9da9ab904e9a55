#![allow(dead_code)] // Test utilities may not all be used in every test

use std::sync::Arc;
use std::time::Duration;

use musicquiz::{
    bot::QuizBot,
    config::QuizConfig,
    sample::Sample,
    stats::{InMemoryStatsRepository, StatsRepository, StatsService},
    websockets::WebsocketReceiveHandler,
};

use super::mocks::{MockConnectionManager, ScriptedProvider};

pub const CHANNEL: &str = "general";
pub const MENTION: &str = "@MusicQuiz";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub bot: Arc<QuizBot>,
    pub provider: Arc<ScriptedProvider>,
    pub mock_conn_manager: Arc<MockConnectionManager>,
    pub stats_service: Arc<StatsService>,
    pub input_handler: WebsocketReceiveHandler,
    pub channel_id: String,
}

pub struct TestSetupBuilder {
    samples: Vec<Sample>,
    config: QuizConfig,
    repository: Option<Arc<dyn StatsRepository>>,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            samples: vec![],
            config: QuizConfig {
                nb_samples: 1,
                guess_time: Duration::from_secs(30),
                cooldown: Duration::from_secs(1),
                max_combo: 2,
                correct_threshold: 0.8,
            },
            repository: None,
        }
    }

    /// Samples played in order; the game length follows their count
    pub fn with_samples(mut self, samples: Vec<Sample>) -> Self {
        self.config.nb_samples = samples.len();
        self.samples = samples;
        self
    }

    pub fn with_nb_samples(mut self, nb_samples: usize) -> Self {
        self.config.nb_samples = nb_samples;
        self
    }

    pub fn with_guess_time(mut self, guess_time: Duration) -> Self {
        self.config.guess_time = guess_time;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn StatsRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn build(self) -> TestSetup {
        let provider = Arc::new(ScriptedProvider::new(self.samples));
        let mock_conn_manager = Arc::new(MockConnectionManager::new());
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryStatsRepository::new()));
        let stats_service = Arc::new(StatsService::new(repository));

        let bot = Arc::new(QuizBot::new(
            self.config,
            MENTION,
            provider.clone(),
            stats_service.clone(),
            mock_conn_manager.clone(),
        ));
        let input_handler = WebsocketReceiveHandler::new(bot.clone());

        TestSetup {
            bot,
            provider,
            mock_conn_manager,
            stats_service,
            input_handler,
            channel_id: CHANNEL.to_string(),
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
