use async_trait::async_trait;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tracing::debug;

use crate::{
    event::{EventError, EventHandler, QuizEvent},
    websockets::{ConnectionManager, MessageBroadcaster, ScoreEntry, WebSocketMessage},
};

const CONGRATS: [&str; 5] = ["yay", "correct", "nice", "good job", "you rock"];
const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Top three of a score table, one line each
pub fn podium(scores: &[(String, u32)]) -> Vec<String> {
    MEDALS
        .iter()
        .zip(scores)
        .map(|(medal, (name, points))| format!("{} - {} - {} pts", medal, name, points))
        .collect()
}

pub fn points_label(points: u32) -> &'static str {
    if points < 2 {
        "pt"
    } else {
        "pts"
    }
}

fn score_entries(scores: &[(String, u32)]) -> Vec<ScoreEntry> {
    scores
        .iter()
        .map(|(player_name, points)| ScoreEntry {
            player_name: player_name.clone(),
            points: *points,
        })
        .collect()
}

fn reveal(track_title: &str) -> String {
    format!("The track was **{}**.", track_title)
}

/// Renders a channel's game events as chat messages
pub struct ChannelAnnouncer {
    channel_id: String,
    connection_manager: Arc<dyn ConnectionManager>,
}

impl ChannelAnnouncer {
    pub fn new(channel_id: impl Into<String>, connection_manager: Arc<dyn ConnectionManager>) -> Self {
        Self {
            channel_id: channel_id.into(),
            connection_manager,
        }
    }

    /// Message shown to players for an event
    pub fn render(&self, event: &QuizEvent) -> WebSocketMessage {
        match event {
            QuizEvent::NewSample {
                sample_number,
                total_samples,
                sample,
            } => WebSocketMessage::new_sample(
                format!(
                    "Guess the track and artist! 🎵\nTo skip it, vote skip.\n{} / {}",
                    sample_number, total_samples
                ),
                *sample_number,
                *total_samples,
                sample.image_url.clone(),
                sample.image_filename().to_string(),
            ),
            QuizEvent::CorrectGuess {
                player_name,
                matched_title,
                points,
                combo,
                next_multiplier,
                scores,
                ..
            } => {
                let congrats = CONGRATS.choose(&mut rand::rng()).copied().unwrap_or("correct");
                let mut text = format!(
                    "@{} {}! You earn **{} {}**. Keep scoring to use your {}x multiplier!",
                    player_name,
                    congrats,
                    points,
                    points_label(*points),
                    next_multiplier
                );
                text.push_str(&format!("\nIt was **{}**\n**Leaderboard**\n", matched_title));
                text.push_str(&podium(scores).join("\n"));

                WebSocketMessage::correct_guess(
                    text,
                    player_name.clone(),
                    matched_title.clone(),
                    *points,
                    *combo,
                    *next_multiplier,
                    score_entries(scores),
                )
            }
            QuizEvent::IncorrectGuess { player_name, guess, .. } => WebSocketMessage::incorrect_guess(
                format!("❌ {}", guess),
                player_name.clone(),
                guess.clone(),
            ),
            QuizEvent::SampleTimeout { track_title } => WebSocketMessage::sample_timeout(
                format!("Time's up! ⏰\n{}", reveal(track_title)),
                track_title.clone(),
            ),
            QuizEvent::SampleSkipped { track_title } => WebSocketMessage::sample_skipped(
                format!("Sample skipped\n{}", reveal(track_title)),
                track_title.clone(),
            ),
            QuizEvent::GameFinished { scores, .. } => {
                let ranking = if scores.is_empty() {
                    "No scores!".to_string()
                } else {
                    podium(scores).join("\n")
                };
                WebSocketMessage::game_finished(
                    format!("The music quiz is finished!\n**Ranking**\n{}", ranking),
                    score_entries(scores),
                )
            }
        }
    }
}

#[async_trait]
impl EventHandler for ChannelAnnouncer {
    async fn handle(&self, event: &QuizEvent) -> Result<(), EventError> {
        let message = self.render(event);
        debug!(channel_id = %self.channel_id, event = %event.kind(), "Announcing event");

        MessageBroadcaster::broadcast_to_channel(&self.connection_manager, &self.channel_id, &message)
            .await
            .map_err(|e| EventError::failed(format!("Failed to serialize message: {}", e)))
    }

    fn name(&self) -> &'static str {
        "ChannelAnnouncer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sample::Sample,
        stats::GameStatistics,
        websockets::{InMemoryConnectionManager, MessageType},
    };

    fn announcer() -> ChannelAnnouncer {
        ChannelAnnouncer::new("general", Arc::new(InMemoryConnectionManager::new()))
    }

    fn text_of(message: &WebSocketMessage) -> String {
        message.payload["text"].as_str().unwrap().to_string()
    }

    #[test]
    fn correct_guess_announces_points_multiplier_and_podium() {
        let message = announcer().render(&QuizEvent::CorrectGuess {
            player_id: "1".to_string(),
            player_name: "alice".to_string(),
            matched_title: "Bohemian Rhapsody".to_string(),
            points: 1,
            combo: 1,
            next_multiplier: 2,
            scores: vec![
                ("alice".to_string(), 3),
                ("bob".to_string(), 2),
                ("carol".to_string(), 1),
                ("dave".to_string(), 0),
            ],
        });

        let text = text_of(&message);
        assert_eq!(message.message_type, MessageType::CorrectGuess);
        assert!(text.starts_with("@alice "));
        assert!(text.contains("You earn **1 pt**. Keep scoring to use your 2x multiplier!"));
        assert!(text.contains("🥇 - alice - 3 pts"));
        assert!(text.contains("🥉 - carol - 1 pts"));
        assert!(!text.contains("dave"));
        assert_eq!(message.payload["next_multiplier"], 2);
    }

    #[test]
    fn capped_multiplier_is_announced() {
        let message = announcer().render(&QuizEvent::CorrectGuess {
            player_id: "1".to_string(),
            player_name: "alice".to_string(),
            matched_title: "Bohemian Rhapsody".to_string(),
            points: 2,
            combo: 4,
            next_multiplier: 2,
            scores: vec![("alice".to_string(), 9)],
        });

        assert!(text_of(&message).contains("You earn **2 pts**. Keep scoring to use your 2x multiplier!"));
    }

    #[test]
    fn new_sample_shows_progress() {
        let message = announcer().render(&QuizEvent::NewSample {
            sample_number: 3,
            total_samples: 12,
            sample: Arc::new(Sample {
                track_title: "Queen - Bohemian Rhapsody".to_string(),
                title: "Bohemian Rhapsody".to_string(),
                aliases: vec![],
                image_url: "https://example.com/covers/abc.jpg".to_string(),
                image_data: vec![],
            }),
        });

        assert!(text_of(&message).ends_with("3 / 12"));
        assert_eq!(message.payload["image_filename"], "abc.jpg");
        // The answer is not leaked
        assert!(!message.payload.to_string().contains("Rhapsody"));
    }

    #[test]
    fn timeout_and_skip_reveal_the_track() {
        let timeout = announcer().render(&QuizEvent::SampleTimeout {
            track_title: "Queen - Bohemian Rhapsody".to_string(),
        });
        let skipped = announcer().render(&QuizEvent::SampleSkipped {
            track_title: "Queen - Bohemian Rhapsody".to_string(),
        });

        assert_eq!(
            text_of(&timeout),
            "Time's up! ⏰\nThe track was **Queen - Bohemian Rhapsody**."
        );
        assert_eq!(
            text_of(&skipped),
            "Sample skipped\nThe track was **Queen - Bohemian Rhapsody**."
        );
    }

    #[test]
    fn finished_game_without_scores() {
        let message = announcer().render(&QuizEvent::GameFinished {
            scores: vec![],
            statistics: GameStatistics::started_now(),
        });

        assert_eq!(
            text_of(&message),
            "The music quiz is finished!\n**Ranking**\nNo scores!"
        );
    }

    #[tokio::test]
    async fn handle_broadcasts_to_the_channel() {
        let manager = Arc::new(InMemoryConnectionManager::new());
        let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
        manager.add_connection("general", "conn-1", sender).await;
        let announcer = ChannelAnnouncer::new("general", manager);

        announcer
            .handle(&QuizEvent::SampleSkipped {
                track_title: "x".to_string(),
            })
            .await
            .unwrap();

        let raw = receiver.recv().await.unwrap();
        let message: WebSocketMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(message.message_type, MessageType::SampleSkipped);
    }
}
