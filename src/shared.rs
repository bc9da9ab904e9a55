use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::bot::QuizBot;
use crate::stats::{StatsError, StatsService};
use crate::websockets::ConnectionManager;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<QuizBot>,
    pub stats_service: Arc<StatsService>,
    pub connection_manager: Arc<dyn ConnectionManager>,
}

impl AppState {
    pub fn new(
        bot: Arc<QuizBot>,
        stats_service: Arc<StatsService>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            bot,
            stats_service,
            connection_manager,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Stats(StatsError::InvalidChannel(channel_id)) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid channel id: {}", channel_id),
            ),
            AppError::Stats(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::config::QuizConfig;
    use crate::sample::{ProviderError, Sample, SampleProvider};
    use crate::stats::InMemoryStatsRepository;
    use crate::websockets::InMemoryConnectionManager;
    use async_trait::async_trait;

    /// Provider with an empty catalog, for tests that never start a game
    pub struct EmptyProvider;

    #[async_trait]
    impl SampleProvider for EmptyProvider {
        async fn fetch_random_sample(&self, _require_solution: bool) -> Result<Sample, ProviderError> {
            Err(ProviderError::Unavailable("empty catalog".to_string()))
        }
    }

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        stats_service: Option<Arc<StatsService>>,
        provider: Option<Arc<dyn SampleProvider>>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                stats_service: None,
                provider: None,
            }
        }

        pub fn with_stats_service(mut self, stats_service: Arc<StatsService>) -> Self {
            self.stats_service = Some(stats_service);
            self
        }

        pub fn with_provider(mut self, provider: Arc<dyn SampleProvider>) -> Self {
            self.provider = Some(provider);
            self
        }

        pub fn build(self) -> AppState {
            let stats_service = self.stats_service.unwrap_or_else(|| {
                Arc::new(StatsService::new(Arc::new(InMemoryStatsRepository::new())))
            });
            let provider = self.provider.unwrap_or_else(|| Arc::new(EmptyProvider));
            let connection_manager: Arc<dyn ConnectionManager> =
                Arc::new(InMemoryConnectionManager::new());
            let bot = Arc::new(QuizBot::new(
                QuizConfig::default(),
                "@musicquiz",
                provider,
                stats_service.clone(),
                connection_manager.clone(),
            ));

            AppState::new(bot, stats_service, connection_manager)
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}
