// Library crate for the music quiz server
// This file exposes the public API for integration tests

pub mod bot;
pub mod config;
pub mod event;
pub mod fuzzy;
pub mod game;
pub mod http;
pub mod sample;
pub mod shared;
pub mod stats;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use bot::{Author, QuizBot};
pub use config::{AppConfig, QuizConfig};
pub use event::{EventBus, EventKind, QuizEvent};
pub use game::{GameEngine, GameStatus};
pub use sample::{Sample, SampleProvider};
pub use shared::{AppError, AppState};
pub use stats::{StatsService, StatsRecorder};
pub use websockets::{ConnectionManager, MessageType, WebSocketMessage};
