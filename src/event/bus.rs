use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::{
    events::{EventKind, QuizEvent},
    handler::{EventError, EventHandler},
};

#[derive(Debug, Clone)]
struct Subscriber {
    name: &'static str,
    sender: mpsc::UnboundedSender<QuizEvent>,
}

/// Publish/subscribe registry for quiz events
///
/// Each registered handler gets its own queue and listener task. Emitting
/// only pushes onto those queues, so it never waits for a handler, and each
/// handler sees events in emission order.
#[derive(Debug, Clone)]
pub struct EventBus {
    /// Event name -> subscribers, in registration order
    subscribers: Arc<RwLock<HashMap<EventKind, Vec<Subscriber>>>>,
    handler_timeout: Duration,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(HashMap::new())),
            handler_timeout: Duration::from_secs(5),
        }
    }

    /// Set the timeout for individual handler execution
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Register a handler for one event
    pub async fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) -> JoinHandle<()> {
        self.subscribe_many(&[kind], handler).await
    }

    /// Register a handler for every event
    pub async fn subscribe_all(&self, handler: Arc<dyn EventHandler>) -> JoinHandle<()> {
        let kinds: Vec<EventKind> = EventKind::iter().collect();
        self.subscribe_many(&kinds, handler).await
    }

    /// Register a handler for several events, sharing one ordered queue
    pub async fn subscribe_many(
        &self,
        kinds: &[EventKind],
        handler: Arc<dyn EventHandler>,
    ) -> JoinHandle<()> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let name = handler.name();

        {
            let mut subscribers = self.subscribers.write().await;
            for kind in kinds {
                subscribers.entry(*kind).or_default().push(Subscriber {
                    name,
                    sender: sender.clone(),
                });
            }
        }

        info!(handler = name, events = ?kinds, "Registered event handler");

        tokio::spawn(listen(handler, receiver, self.handler_timeout))
    }

    /// Queue an event for every subscriber of its kind, returning how many
    /// subscribers it was queued for
    pub async fn emit(&self, event: QuizEvent) -> usize {
        let kind = event.kind();
        let subscribers = self.subscribers.read().await;

        let mut delivered = 0;
        for subscriber in subscribers.get(&kind).into_iter().flatten() {
            if subscriber.sender.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(
                    handler = subscriber.name,
                    event = %kind,
                    "Subscriber listener is gone, event dropped"
                );
            }
        }

        debug!(event = %kind, receivers = delivered, "Quiz event emitted");
        delivered
    }
}

/// Drain one subscriber's queue until the bus is dropped
async fn listen(
    handler: Arc<dyn EventHandler>,
    mut receiver: mpsc::UnboundedReceiver<QuizEvent>,
    handler_timeout: Duration,
) {
    let handler_name = handler.name();

    while let Some(event) = receiver.recv().await {
        let kind = event.kind();
        let task_handler = handler.clone();

        // Spawned so a panicking handler does not kill the listener
        let outcome = tokio::spawn(async move {
            match timeout(handler_timeout, task_handler.handle(&event)).await {
                Ok(result) => result,
                Err(_) => Err(EventError::Timeout),
            }
        })
        .await
        .unwrap_or_else(|join_error| Err(EventError::Panic(join_error.to_string())));

        match outcome {
            Ok(()) => {}
            Err(EventError::Panic(message)) => {
                error!(handler = handler_name, event = %kind, panic = %message, "Event handler panicked");
            }
            Err(e) => {
                warn!(handler = handler_name, event = %kind, error = %e, "Event handler failed");
            }
        }
    }

    debug!(handler = handler_name, "Event listener stopped");
}
