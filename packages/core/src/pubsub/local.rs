use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::Mutex;

use super::{MessageStream, TickerBroker};
use crate::error::AppError;

/// Messages buffered per channel before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 256;

/// In-process broker built on `tokio::sync::broadcast`.
///
/// Like Redis pub/sub, a message published while nobody is subscribed is
/// dropped. Clones share the same channels.
#[derive(Clone, Default)]
pub struct LocalBroker {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
}

impl LocalBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions on `channel`.
    pub async fn receiver_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .await
            .get(channel)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    async fn sender(&self, channel: &str) -> broadcast::Sender<String> {
        self.channels
            .lock()
            .await
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl TickerBroker for LocalBroker {
    async fn subscribe(&self, channel: &str) -> Result<MessageStream, AppError> {
        let receiver = self.sender(channel).await.subscribe();
        let channel = channel.to_string();

        let messages = stream::unfold(receiver, move |mut receiver| {
            let channel = channel.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(payload) => return Some((payload, receiver)),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!("Subscriber on {} lagged, {} messages skipped", channel, skipped);
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
        });

        Ok(messages.boxed())
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, AppError> {
        // No receivers is not an error for pub/sub.
        Ok(self.sender(channel).await.send(payload.to_string()).unwrap_or(0))
    }

    fn broker_name(&self) -> &str {
        "local"
    }
}
