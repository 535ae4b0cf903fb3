use async_trait::async_trait;
use futures::StreamExt;
use redis::{AsyncCommands, Client};

use super::{MessageStream, TickerBroker};
use crate::config::redact_url;
use crate::error::AppError;

/// Redis-backed broker. Each subscription gets its own pub/sub connection;
/// publishing goes through a multiplexed connection.
#[derive(Clone)]
pub struct RedisBroker {
    client: Client,
}

impl RedisBroker {
    /// Open a client for `url` and check the server answers `PING`.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let client = Client::open(url)?;

        let mut conn = client.get_multiplexed_async_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::info!("Redis connected at {} ({})", redact_url(url), pong);

        Ok(Self { client })
    }
}

#[async_trait]
impl TickerBroker for RedisBroker {
    async fn subscribe(&self, channel: &str) -> Result<MessageStream, AppError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;

        let messages = pubsub
            .into_on_message()
            .filter_map(|msg| async move { decode_payload(&msg) });

        Ok(messages.boxed())
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let receivers: usize = conn.publish(channel, payload).await?;
        Ok(receivers)
    }

    fn broker_name(&self) -> &str {
        "redis"
    }
}

/// Payload of a pub/sub message as text; non-UTF-8 payloads are dropped.
fn decode_payload(msg: &redis::Msg) -> Option<String> {
    match msg.get_payload::<String>() {
        Ok(payload) => Some(payload),
        Err(err) => {
            tracing::warn!(
                "Dropping undecodable message on {}: {}",
                msg.get_channel_name(),
                err
            );
            None
        }
    }
}
