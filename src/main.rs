use musicquiz::{
    bot::QuizBot,
    config::AppConfig,
    http,
    sample::CatalogProvider,
    shared::AppState,
    stats::{JsonFileStatsRepository, StatsService},
    websockets::{ConnectionManager, InMemoryConnectionManager},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "musicquiz=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        nb_samples = config.quiz.nb_samples,
        "Starting music quiz server"
    );

    let provider = Arc::new(CatalogProvider::from_file(&config.catalog_path).await?);
    if provider.is_empty() {
        warn!(path = %config.catalog_path.display(), "Sample catalog is empty, games will abort");
    }
    let stats_repository = Arc::new(JsonFileStatsRepository::new(config.stats_dir.clone()));
    let stats_service = Arc::new(StatsService::new(stats_repository));
    let connection_manager: Arc<dyn ConnectionManager> = Arc::new(InMemoryConnectionManager::new());

    let bot = Arc::new(QuizBot::new(
        config.quiz.clone(),
        config.bot_mention.clone(),
        provider,
        stats_service.clone(),
        connection_manager.clone(),
    ));

    let app_state = AppState::new(bot, stats_service, connection_manager);

    let app = http::router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
