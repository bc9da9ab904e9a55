use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Open websocket connections, grouped by channel
#[async_trait]
pub trait ConnectionManager: Send + Sync {
    async fn add_connection(&self, channel_id: &str, connection_id: &str, sender: mpsc::UnboundedSender<String>);

    async fn remove_connection(&self, channel_id: &str, connection_id: &str);

    /// Send a raw message to every connection of a channel
    async fn send_to_channel(&self, channel_id: &str, message: &str);

    async fn connection_count(&self, channel_id: &str) -> usize;
}

#[derive(Default)]
pub struct InMemoryConnectionManager {
    // channel id -> connection id -> sender
    channels: Arc<RwLock<HashMap<String, HashMap<String, mpsc::UnboundedSender<String>>>>>,
}

impl InMemoryConnectionManager {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl ConnectionManager for InMemoryConnectionManager {
    async fn add_connection(&self, channel_id: &str, connection_id: &str, sender: mpsc::UnboundedSender<String>) {
        let mut channels = self.channels.write().await;
        channels
            .entry(channel_id.to_string())
            .or_default()
            .insert(connection_id.to_string(), sender);
    }

    async fn remove_connection(&self, channel_id: &str, connection_id: &str) {
        let mut channels = self.channels.write().await;
        if let Some(connections) = channels.get_mut(channel_id) {
            connections.remove(connection_id);
            if connections.is_empty() {
                channels.remove(channel_id);
            }
        }
    }

    async fn send_to_channel(&self, channel_id: &str, message: &str) {
        let channels = self.channels.read().await;
        let Some(connections) = channels.get(channel_id) else {
            debug!(channel_id = %channel_id, "No connections in channel, message dropped");
            return;
        };
        for sender in connections.values() {
            let _ = sender.send(message.to_string());
        }
    }

    async fn connection_count(&self, channel_id: &str) -> usize {
        let channels = self.channels.read().await;
        channels.get(channel_id).map_or(0, HashMap::len)
    }
}
