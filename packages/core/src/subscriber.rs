//! Ticker subscription loop.
//!
//! Listens on the configured Pub/Sub channel and hands each ticker to the
//! [`TickerProcessor`], one message at a time. A broken subscription is
//! re-established after a fixed delay; a bad message is logged and skipped.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::time;

use crate::metrics::AppMetrics;
use crate::pubsub::{MessageStream, TickerBroker};
use crate::ticker::parse_ticker_message;
use crate::worker::TickerProcessor;

#[derive(Debug, Clone)]
pub struct SubscriptionSettings {
    pub channel: String,
    /// Pause before subscribing again after an error or a closed stream.
    pub resubscribe_delay: Duration,
}

/// Result of handling one Pub/Sub payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Processed,
    /// No usable ticker in the payload.
    Ignored,
    Failed,
}

impl MessageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageOutcome::Processed => "processed",
            MessageOutcome::Ignored => "ignored",
            MessageOutcome::Failed => "failed",
        }
    }
}

/// Run the subscription loop until `shutdown` resolves.
///
/// A message that is already being processed is finished before the loop
/// observes the shutdown signal.
pub async fn run_ticker_subscription(
    broker: Arc<dyn TickerBroker + Send + Sync>,
    processor: Arc<TickerProcessor>,
    metrics: Arc<AppMetrics>,
    settings: SubscriptionSettings,
    shutdown: impl Future<Output = ()> + Send,
) {
    tokio::pin!(shutdown);

    tracing::info!(
        "Ticker subscription started (broker: {}, channel: {})",
        broker.broker_name(),
        settings.channel
    );

    loop {
        let subscription = tokio::select! {
            result = broker.subscribe(&settings.channel) => result,
            _ = shutdown.as_mut() => break,
        };

        match subscription {
            Ok(messages) => {
                tracing::info!("Subscribed to channel: {}", settings.channel);
                let stopped =
                    consume(messages, &processor, &metrics, &mut shutdown).await;
                if stopped {
                    break;
                }
                tracing::warn!("Subscription to {} ended", settings.channel);
            }
            Err(err) => {
                tracing::error!("Subscription error on {}: {}", settings.channel, err);
                metrics
                    .worker_errors_total
                    .with_label_values(&["subscriber"])
                    .inc();
            }
        }

        tracing::info!(
            "Resubscribing in {}s",
            settings.resubscribe_delay.as_secs_f64()
        );
        tokio::select! {
            _ = time::sleep(settings.resubscribe_delay) => {}
            _ = shutdown.as_mut() => break,
        }
    }

    metrics.active_subscriptions.set(0.0);
    tracing::info!("Ticker subscription stopped cleanly");
}

/// Drain one subscription. Returns `true` if shutdown was requested and
/// `false` if the stream ended on its own.
async fn consume<F>(
    mut messages: MessageStream,
    processor: &TickerProcessor,
    metrics: &AppMetrics,
    shutdown: &mut Pin<&mut F>,
) -> bool
where
    F: Future<Output = ()>,
{
    metrics.active_subscriptions.set(1.0);

    let stopped = loop {
        let payload = tokio::select! {
            next = messages.next() => next,
            _ = shutdown.as_mut() => break true,
        };

        match payload {
            Some(payload) => {
                handle_message(processor, metrics, &payload).await;
            }
            None => break false,
        }
    };

    metrics.active_subscriptions.set(0.0);
    stopped
}

/// Parse one payload and run the processor on its ticker.
pub async fn handle_message(
    processor: &TickerProcessor,
    metrics: &AppMetrics,
    payload: &str,
) -> MessageOutcome {
    tracing::debug!("Received message: {}", payload);

    let outcome = match parse_ticker_message(payload) {
        None => {
            tracing::warn!("Ignoring message without a valid ticker: {:?}", payload);
            MessageOutcome::Ignored
        }
        Some(event) => {
            tracing::info!(
                "Ticker event: {} (action: {}, user: {:?})",
                event.ticker,
                event.action,
                event.user_id
            );
            match processor.process(&event.ticker).await {
                Ok(_) => MessageOutcome::Processed,
                Err(_) => MessageOutcome::Failed,
            }
        }
    };

    metrics
        .messages_processed_total
        .with_label_values(&[outcome.as_str()])
        .inc();
    outcome
}
