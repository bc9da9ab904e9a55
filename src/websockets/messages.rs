use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::stats::AggregatedPlayerStat;

/// Message types for WebSocket communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Client -> Server
    Chat,
    Skip,

    // Server -> Client
    Notice,
    Error,
    NewSample,
    CorrectGuess,
    IncorrectGuess,
    SampleTimeout,
    SampleSkipped,
    GameFinished,
    Stats,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub meta: Option<WebSocketMessageMeta>,
}

/// Client-to-Server message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatPayload {
    pub content: String,
}

/// Server-to-Client message payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticePayload {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSamplePayload {
    pub text: String,
    pub sample_number: usize,
    pub total_samples: usize,
    pub image_url: String,
    pub image_filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub player_name: String,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectGuessPayload {
    pub text: String,
    pub player_name: String,
    pub matched_title: String,
    pub points: u32,
    pub combo: u32,
    pub next_multiplier: u32,
    pub leaderboard: Vec<ScoreEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncorrectGuessPayload {
    pub text: String,
    pub player_name: String,
    pub guess: String,
}

/// Payload of SAMPLE_TIMEOUT and SAMPLE_SKIPPED
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealPayload {
    pub text: String,
    pub track_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameFinishedPayload {
    pub text: String,
    pub scores: Vec<ScoreEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsPayload {
    pub text: String,
    pub games_played: usize,
    pub ranking: Vec<AggregatedPlayerStat>,
}

fn to_payload<T: Serialize>(payload: T) -> Value {
    serde_json::to_value(payload).unwrap_or(Value::Null)
}

/// Helper functions for creating messages
impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta { timestamp: Utc::now() }),
        }
    }

    /// Create a CHAT message, as sent by clients
    pub fn chat(content: String) -> Self {
        Self::new(MessageType::Chat, to_payload(ChatPayload { content }))
    }

    /// Create a SKIP vote, as sent by clients
    pub fn skip() -> Self {
        Self::new(MessageType::Skip, Value::Null)
    }

    /// Create a NOTICE message
    pub fn notice(text: String) -> Self {
        Self::new(MessageType::Notice, to_payload(NoticePayload { text }))
    }

    /// Create an ERROR message
    pub fn error(text: String) -> Self {
        Self::new(MessageType::Error, to_payload(ErrorPayload { text }))
    }

    /// Create a NEW_SAMPLE message
    pub fn new_sample(
        text: String,
        sample_number: usize,
        total_samples: usize,
        image_url: String,
        image_filename: String,
    ) -> Self {
        let payload = NewSamplePayload {
            text,
            sample_number,
            total_samples,
            image_url,
            image_filename,
        };
        Self::new(MessageType::NewSample, to_payload(payload))
    }

    /// Create a CORRECT_GUESS message
    pub fn correct_guess(
        text: String,
        player_name: String,
        matched_title: String,
        points: u32,
        combo: u32,
        next_multiplier: u32,
        leaderboard: Vec<ScoreEntry>,
    ) -> Self {
        let payload = CorrectGuessPayload {
            text,
            player_name,
            matched_title,
            points,
            combo,
            next_multiplier,
            leaderboard,
        };
        Self::new(MessageType::CorrectGuess, to_payload(payload))
    }

    /// Create an INCORRECT_GUESS message
    pub fn incorrect_guess(text: String, player_name: String, guess: String) -> Self {
        let payload = IncorrectGuessPayload {
            text,
            player_name,
            guess,
        };
        Self::new(MessageType::IncorrectGuess, to_payload(payload))
    }

    /// Create a SAMPLE_TIMEOUT message
    pub fn sample_timeout(text: String, track_title: String) -> Self {
        Self::new(
            MessageType::SampleTimeout,
            to_payload(RevealPayload { text, track_title }),
        )
    }

    /// Create a SAMPLE_SKIPPED message
    pub fn sample_skipped(text: String, track_title: String) -> Self {
        Self::new(
            MessageType::SampleSkipped,
            to_payload(RevealPayload { text, track_title }),
        )
    }

    /// Create a GAME_FINISHED message
    pub fn game_finished(text: String, scores: Vec<ScoreEntry>) -> Self {
        Self::new(
            MessageType::GameFinished,
            to_payload(GameFinishedPayload { text, scores }),
        )
    }

    /// Create a STATS message
    pub fn stats(text: String, games_played: usize, ranking: Vec<AggregatedPlayerStat>) -> Self {
        let payload = StatsPayload {
            text,
            games_played,
            ranking,
        };
        Self::new(MessageType::Stats, to_payload(payload))
    }
}
