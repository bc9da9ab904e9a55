#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use musicquiz::{
    sample::{ProviderError, Sample, SampleProvider},
    websockets::ConnectionManager,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

pub fn sample(title: &str, track_title: &str) -> Sample {
    Sample {
        track_title: track_title.to_string(),
        title: title.to_string(),
        aliases: vec![],
        image_url: format!("https://img.example/{}.png", title.replace(' ', "-")),
        image_data: vec![],
    }
}

/// Provider handing out a fixed list of samples in order, then failing
pub struct ScriptedProvider {
    samples: Vec<Sample>,
    next: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            next: AtomicUsize::new(0),
        }
    }

    pub fn fetched(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SampleProvider for ScriptedProvider {
    async fn fetch_random_sample(&self, _require_solution: bool) -> Result<Sample, ProviderError> {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        self.samples
            .get(index)
            .cloned()
            .ok_or_else(|| ProviderError::Unavailable(format!("no sample #{}", index)))
    }
}

/// Connection manager recording every message sent to a channel
#[derive(Clone, Default)]
pub struct MockConnectionManager {
    sent_messages: Arc<RwLock<HashMap<String, VecDeque<String>>>>,
}

impl MockConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_messages_for(&self, channel_id: &str) -> Vec<String> {
        self.sent_messages
            .read()
            .await
            .get(channel_id)
            .map(|messages| messages.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Pop the oldest message sent to a channel
    pub async fn consume_message_for(&self, channel_id: &str) -> Option<String> {
        self.sent_messages
            .write()
            .await
            .get_mut(channel_id)
            .and_then(VecDeque::pop_front)
    }

    pub async fn clear_messages(&self) {
        self.sent_messages.write().await.clear();
    }
}

#[async_trait]
impl ConnectionManager for MockConnectionManager {
    async fn add_connection(&self, _channel_id: &str, _connection_id: &str, _sender: mpsc::UnboundedSender<String>) {}

    async fn remove_connection(&self, _channel_id: &str, _connection_id: &str) {}

    async fn send_to_channel(&self, channel_id: &str, message: &str) {
        self.sent_messages
            .write()
            .await
            .entry(channel_id.to_string())
            .or_default()
            .push_back(message.to_string());
    }

    async fn connection_count(&self, channel_id: &str) -> usize {
        usize::from(self.sent_messages.read().await.contains_key(channel_id))
    }
}
