use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::shared::{AppError, AppState};
use crate::stats::AggregatedPlayerStat;
use crate::websockets::websocket_handler;

#[derive(Debug, Serialize)]
pub struct ChannelStatsResponse {
    pub channel_id: String,
    pub games_played: usize,
    pub ranking: Vec<AggregatedPlayerStat>,
}

/// Routes of the quiz server
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Music quiz is up" }))
        .route("/ws/:channel_id", get(websocket_handler))
        .route("/channels/:channel_id/stats", get(channel_stats))
        .with_state(app_state)
}

/// HTTP handler for a channel's ranking
///
/// GET /channels/:channel_id/stats
#[instrument(name = "channel_stats", skip(state))]
pub async fn channel_stats(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<Json<ChannelStatsResponse>, AppError> {
    let leaderboard = state.stats_service.leaderboard(&channel_id).await?;

    info!(
        channel_id = %channel_id,
        games_played = leaderboard.games_played,
        ranked = leaderboard.ranking.len(),
        "Channel statistics served"
    );

    Ok(Json(ChannelStatsResponse {
        channel_id,
        games_played: leaderboard.games_played,
        ranking: leaderboard.ranking,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::stats::{
        GameStatistics, GuessRecord, InMemoryStatsRepository, JsonFileStatsRepository, StatsService,
    };
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = router(AppStateBuilder::new().build());

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_of_unknown_channel_are_empty() {
        let app = router(AppStateBuilder::new().build());

        let (status, body) = get_json(app, "/channels/general/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["channel_id"], "general");
        assert_eq!(body["games_played"], 0);
        assert_eq!(body["ranking"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn test_stats_rank_regular_players_only() {
        let repository = Arc::new(InMemoryStatsRepository::new());
        let stats_service = Arc::new(StatsService::new(repository));
        let correct = GuessRecord {
            is_correct: true,
            is_ace: true,
            reaction_time: Some(2.0),
            streak: 1,
            precision: Some(1.0),
        };
        for game in 0..10 {
            let mut statistics = GameStatistics::started_now();
            statistics.record_guess("1", "alice", &correct);
            if game == 0 {
                statistics.record_guess("2", "bob", &correct);
            }
            stats_service.record_game("general", statistics).await.unwrap();
        }
        let app = router(
            AppStateBuilder::new()
                .with_stats_service(stats_service)
                .build(),
        );

        let (status, body) = get_json(app, "/channels/general/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["games_played"], 10);
        let ranking = body["ranking"].as_array().unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0]["player_name"], "alice");
        assert_eq!(ranking[0]["nb_games"], 10);
    }

    #[tokio::test]
    async fn test_invalid_channel_is_a_bad_request() {
        let dir = std::env::temp_dir().join(format!("musicquiz-http-{}", uuid::Uuid::new_v4()));
        let stats_service = Arc::new(StatsService::new(Arc::new(JsonFileStatsRepository::new(&dir))));
        let app = router(
            AppStateBuilder::new()
                .with_stats_service(stats_service)
                .build(),
        );

        let (status, body) = get_json(app, "/channels/bad%20channel/stats").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Invalid channel id"));
    }
}
