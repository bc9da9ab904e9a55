use std::sync::Arc;

use super::{connection_manager::ConnectionManager, messages::WebSocketMessage};

pub struct MessageBroadcaster;

impl MessageBroadcaster {
    pub async fn broadcast_to_channel(
        connection_manager: &Arc<dyn ConnectionManager>,
        channel_id: &str,
        message: &WebSocketMessage,
    ) -> Result<(), serde_json::Error> {
        let message_json = serde_json::to_string(message)?;
        connection_manager.send_to_channel(channel_id, &message_json).await;
        Ok(())
    }
}
