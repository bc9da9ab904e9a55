use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info};

use super::{models::GameStatistics, StatsError};

/// Per-channel history of finished games
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Every recorded game of the channel, empty when none was recorded
    async fn load_games(&self, channel_id: &str) -> Result<Vec<GameStatistics>, StatsError>;

    /// Add a finished game to the channel's history
    async fn append_game(&self, channel_id: &str, game: GameStatistics) -> Result<(), StatsError>;
}

#[derive(Debug, Default)]
pub struct InMemoryStatsRepository {
    channels: Arc<RwLock<HashMap<String, Vec<GameStatistics>>>>,
}

impl InMemoryStatsRepository {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl StatsRepository for InMemoryStatsRepository {
    async fn load_games(&self, channel_id: &str) -> Result<Vec<GameStatistics>, StatsError> {
        let channels = self.channels.read().await;
        Ok(channels.get(channel_id).cloned().unwrap_or_default())
    }

    async fn append_game(&self, channel_id: &str, game: GameStatistics) -> Result<(), StatsError> {
        let mut channels = self.channels.write().await;
        channels.entry(channel_id.to_string()).or_default().push(game);
        Ok(())
    }
}

/// One JSON array of games per channel, at `<dir>/<channel_id>.json`
///
/// Appending rewrites the whole file. Writers of a channel are serialized
/// so concurrent games cannot lose each other's records.
#[derive(Debug)]
pub struct JsonFileStatsRepository {
    dir: PathBuf,
    channel_locks: Arc<RwLock<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl JsonFileStatsRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            channel_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn channel_path(&self, channel_id: &str) -> Result<PathBuf, StatsError> {
        let valid = !channel_id.is_empty()
            && channel_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StatsError::InvalidChannel(channel_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", channel_id)))
    }

    async fn channel_lock(&self, channel_id: &str) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.channel_locks.read().await;
            if let Some(lock) = guard.get(channel_id) {
                return lock.clone();
            }
        }

        let mut guard = self.channel_locks.write().await;
        guard
            .entry(channel_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    async fn read_games(path: &Path) -> Result<Vec<GameStatistics>, StatsError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No statistics file yet");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl StatsRepository for JsonFileStatsRepository {
    async fn load_games(&self, channel_id: &str) -> Result<Vec<GameStatistics>, StatsError> {
        let path = self.channel_path(channel_id)?;
        Self::read_games(&path).await
    }

    async fn append_game(&self, channel_id: &str, game: GameStatistics) -> Result<(), StatsError> {
        let path = self.channel_path(channel_id)?;
        let lock = self.channel_lock(channel_id).await;
        let _guard = lock.lock().await;

        let mut games = Self::read_games(&path).await?;
        games.push(game);

        tokio::fs::create_dir_all(&self.dir).await?;
        let content = serde_json::to_string(&games)?;

        // Write then rename, so readers never see a half-written file
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        info!(channel_id = %channel_id, games = games.len(), "Saved channel statistics");
        Ok(())
    }
}
