use async_trait::async_trait;
use thiserror::Error;

use super::events::QuizEvent;

/// Errors that can occur when handling events
///
/// The bus only logs them: a failed delivery is never retried.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Handler timed out")]
    Timeout,

    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Handler panicked: {0}")]
    Panic(String),
}

impl EventError {
    pub fn failed(msg: impl Into<String>) -> Self {
        EventError::Failed(msg.into())
    }
}

/// Trait for components reacting to quiz events
///
/// Handlers run on their own task, so a slow handler only delays its own
/// queue of events, never the game itself.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &QuizEvent) -> Result<(), EventError>;

    /// Get a human-readable name for this handler (for logging/debugging)
    fn name(&self) -> &'static str;
}
