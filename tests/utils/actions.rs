#![allow(dead_code)] // Test utilities may not all be used in every test

use tokio::time::{sleep, Duration};

use musicquiz::{
    bot::Author,
    websockets::{MessageHandler, MessageType, WebSocketMessage},
};

use super::setup::{TestSetup, MENTION};

/// Virtual time a test waits for an expected message
const WAIT_BUDGET: Duration = Duration::from_secs(120);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// Action Helpers
// ============================================================================

pub fn author(player_name: &str) -> Author {
    Author::new(format!("id-{}", player_name), player_name)
}

impl TestSetup {
    /// Send a WebSocket message and wait for processing
    pub async fn send_message(&self, player_name: &str, message: WebSocketMessage) {
        let message_json = serde_json::to_string(&message).unwrap();
        self.input_handler
            .handle_message(&self.channel_id, &author(player_name), message_json)
            .await;
        sleep(Duration::from_millis(10)).await;
    }

    /// Post a chat message in the channel
    pub async fn send_chat(&self, player_name: &str, content: &str) {
        self.send_message(player_name, WebSocketMessage::chat(content.to_string()))
            .await;
    }

    /// Address a command to the bot
    pub async fn send_command(&self, player_name: &str, command: &str) {
        self.send_chat(player_name, &format!("{} {}", MENTION, command))
            .await;
    }

    pub async fn send_skip(&self, player_name: &str) {
        self.send_message(player_name, WebSocketMessage::skip()).await;
    }

    /// Next message of the given type, dropping the ones before it
    ///
    /// Panics when nothing matching arrives within the wait budget.
    pub async fn wait_for(&self, expected_type: MessageType) -> WebSocketMessage {
        let mut waited = Duration::ZERO;
        loop {
            while let Some(raw) = self
                .mock_conn_manager
                .consume_message_for(&self.channel_id)
                .await
            {
                let message: WebSocketMessage = serde_json::from_str(&raw).unwrap();
                if message.message_type == expected_type {
                    return message;
                }
            }

            assert!(
                waited < WAIT_BUDGET,
                "no {:?} message received in {:?}",
                expected_type,
                WAIT_BUDGET
            );
            sleep(POLL_INTERVAL).await;
            waited += POLL_INTERVAL;
        }
    }

    /// Every message type sent to the channel so far, without consuming them
    pub async fn sent_types(&self) -> Vec<MessageType> {
        self.mock_conn_manager
            .get_messages_for(&self.channel_id)
            .await
            .iter()
            .map(|raw| serde_json::from_str::<WebSocketMessage>(raw).unwrap().message_type)
            .collect()
    }

    /// Wait until the channel's history holds `expected` games
    pub async fn wait_for_history(&self, expected: usize) {
        let mut waited = Duration::ZERO;
        loop {
            let games = self.stats_service.history(&self.channel_id).await.unwrap();
            if games.len() >= expected {
                return;
            }
            assert!(waited < WAIT_BUDGET, "history never reached {} games", expected);
            sleep(POLL_INTERVAL).await;
            waited += POLL_INTERVAL;
        }
    }

    /// Text of every notice sent to the channel so far
    pub async fn sent_notices(&self) -> Vec<String> {
        self.mock_conn_manager
            .get_messages_for(&self.channel_id)
            .await
            .iter()
            .map(|raw| serde_json::from_str::<WebSocketMessage>(raw).unwrap())
            .filter(|message| message.message_type == MessageType::Notice)
            .map(|message| message.payload["text"].as_str().unwrap().to_string())
            .collect()
    }

    /// Wait until the bot no longer holds an engine for the channel
    pub async fn wait_for_engine_released(&self) {
        let mut waited = Duration::ZERO;
        while self.bot.engine(&self.channel_id).await.is_some() {
            assert!(waited < WAIT_BUDGET, "engine of {} never released", self.channel_id);
            sleep(POLL_INTERVAL).await;
            waited += POLL_INTERVAL;
        }
    }
}
