use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bot::{Author, QuizBot};
use crate::shared::{AppError, AppState};

use super::{
    messages::{ChatPayload, MessageType, WebSocketMessage},
    socket::{Connection, MessageHandler},
};

/// Message handler for receiving WebSocket messages from the client
pub struct WebsocketReceiveHandler {
    bot: Arc<QuizBot>,
}

impl WebsocketReceiveHandler {
    pub fn new(bot: Arc<QuizBot>) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MessageHandler for WebsocketReceiveHandler {
    async fn handle_message(&self, channel_id: &str, author: &Author, message: String) {
        debug!(
            channel_id = %channel_id,
            player_id = %author.player_id,
            message = %message,
            "Received message"
        );

        let ws_message = match serde_json::from_str::<WebSocketMessage>(&message) {
            Ok(ws_message) => ws_message,
            Err(e) => {
                warn!(
                    channel_id = %channel_id,
                    player_id = %author.player_id,
                    error = %e,
                    "Failed to parse WebSocket message"
                );
                return;
            }
        };

        match ws_message.message_type {
            MessageType::Chat => match serde_json::from_value::<ChatPayload>(ws_message.payload) {
                Ok(chat) => {
                    if let Err(e) = self.bot.handle_message(channel_id, author, &chat.content).await {
                        warn!(channel_id = %channel_id, error = %e, "Failed to handle chat message");
                    }
                }
                Err(e) => {
                    warn!(channel_id = %channel_id, error = %e, "Invalid chat payload");
                }
            },
            MessageType::Skip => {
                self.bot.handle_skip(channel_id, author).await;
            }
            other => {
                debug!(message_type = ?other, "Unhandled message type");
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub player_id: String,
    pub player_name: String,
}

/// GET /ws/:channel_id?player_id=..&player_name=..
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(channel_id): Path<String>,
    Query(params): Query<ConnectParams>,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    if params.player_id.trim().is_empty() || params.player_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "player_id and player_name are required".to_string(),
        ));
    }

    let author = Author::new(params.player_id.trim(), params.player_name.trim());
    info!(
        channel_id = %channel_id,
        player_id = %author.player_id,
        "WebSocket connection requested"
    );

    Ok(ws.on_upgrade(move |socket| handle_websocket_connection(socket, channel_id, author, app_state)))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(
    socket: axum::extract::ws::WebSocket,
    channel_id: String,
    author: Author,
    app_state: AppState,
) {
    let connection_id = Uuid::new_v4().to_string();
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    app_state
        .connection_manager
        .add_connection(&channel_id, &connection_id, outbound_sender)
        .await;

    info!(
        channel_id = %channel_id,
        player_id = %author.player_id,
        connection_id = %connection_id,
        "WebSocket connection established"
    );

    let message_handler = Arc::new(WebsocketReceiveHandler::new(app_state.bot.clone()));
    let connection = Connection::new(
        author.clone(),
        channel_id.clone(),
        Box::new(socket),
        outbound_receiver,
        message_handler,
    );

    match connection.run().await {
        Ok(()) => {
            info!(
                channel_id = %channel_id,
                player_id = %author.player_id,
                "WebSocket connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(
                channel_id = %channel_id,
                player_id = %author.player_id,
                error = %e,
                "WebSocket connection error"
            );
        }
    }

    app_state
        .connection_manager
        .remove_connection(&channel_id, &connection_id)
        .await;
}
