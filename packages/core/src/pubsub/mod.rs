//! Pub/Sub broker abstraction
//!
//! The worker only needs two things from a broker: a stream of raw payloads
//! for one channel, and a way to publish a payload. [`RedisBroker`] talks to
//! a real Redis server; [`LocalBroker`] keeps everything in-process for
//! development and tests.

pub mod local;
pub mod redis_broker;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::BrokerConfig;
use crate::error::AppError;

pub use self::local::LocalBroker;
pub use self::redis_broker::RedisBroker;

/// Raw message payloads of one subscription, in arrival order.
pub type MessageStream = BoxStream<'static, String>;

#[async_trait]
pub trait TickerBroker {
    /// Subscribe to `channel`. The stream ends when the subscription drops.
    async fn subscribe(&self, channel: &str) -> Result<MessageStream, AppError>;

    /// Publish `payload` on `channel`. Returns the number of subscribers that received it.
    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, AppError>;

    /// Get the name of this broker for logging/debugging
    fn broker_name(&self) -> &str;
}

/// Build the broker selected by the configuration, verifying connectivity.
pub async fn connect_broker(
    config: &BrokerConfig,
) -> Result<Arc<dyn TickerBroker + Send + Sync>, AppError> {
    match config {
        BrokerConfig::Local => {
            tracing::info!("Using in-process broker (no Redis)");
            Ok(Arc::new(LocalBroker::new()))
        }
        BrokerConfig::Redis { url } => Ok(Arc::new(RedisBroker::connect(url).await?)),
    }
}
