//! Process wiring: builds every component from [`Config`] and runs them.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;

use crate::api::{create_router, AppState};
use crate::config::{BrokerConfig, Config};
use crate::db;
use crate::error::AppError;
use crate::metrics::AppMetrics;
use crate::pubsub::connect_broker;
use crate::repository::TickerRepository;
use crate::services::market_data::YahooFinanceClient;
use crate::subscriber::{run_ticker_subscription, SubscriptionSettings};
use crate::ticker::{normalize_ticker, TickerEvent};
use crate::worker::TickerProcessor;

/// Run the subscription loop and the HTTP API until Ctrl+C or SIGTERM.
pub async fn run(config: Config) -> Result<(), AppError> {
    tracing::info!("Service starting with config: {:?}", config);

    let pool = db::create_pool(&config.database_url).await?;
    let repository = Arc::new(TickerRepository::new(pool));
    let metrics = Arc::new(AppMetrics::new()?);

    let provider = Arc::new(YahooFinanceClient::new(config.market_data_url.clone())?);
    tracing::info!("Market data provider: {}", provider.base_url());
    let processor = Arc::new(TickerProcessor::new(
        provider,
        repository.clone(),
        metrics.clone(),
    ));

    let broker = connect_broker(&config.broker).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let subscription = tokio::spawn(run_ticker_subscription(
        broker,
        processor.clone(),
        metrics.clone(),
        SubscriptionSettings {
            channel: config.channel.clone(),
            resubscribe_delay: Duration::from_secs(config.resubscribe_delay_seconds),
        },
        wait_for_shutdown(shutdown_rx.clone()),
    ));

    let app = create_router(AppState {
        repository,
        processor,
        metrics,
        worker_secret: Arc::from(config.worker_secret.as_str()),
    });

    let addr = format!("{}:{}", config.api_host, config.api_port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|err| AppError::Network(format!("Failed to bind {}: {}", addr, err)))?;
    tracing::info!("HTTP API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
        .await
        .map_err(|err| AppError::Network(format!("HTTP server error: {}", err)))?;

    if let Err(err) = subscription.await {
        tracing::error!("Subscription task failed: {}", err);
    }

    tracing::info!("Service stopped");
    Ok(())
}

/// Publish one ticker event on the configured channel.
pub async fn publish(
    config: &Config,
    ticker: &str,
    action: &str,
    user_id: Option<i64>,
) -> Result<usize, AppError> {
    if config.broker == BrokerConfig::Local {
        return Err(AppError::Config(
            "publishing needs a Redis broker; set ENV=docker|prod or pass --redis-url".into(),
        ));
    }

    let ticker = normalize_ticker(ticker).ok_or_else(|| AppError::InvalidTicker(ticker.to_string()))?;
    let event = TickerEvent::new(ticker, action.to_string(), user_id);
    let payload = serde_json::to_string(&event).map_err(|err| AppError::Parse(err.to_string()))?;

    let broker = connect_broker(&config.broker).await?;
    let receivers = broker.publish(&config.channel, &payload).await?;
    tracing::info!(
        "Published {} to {} ({} subscriber(s))",
        event.ticker,
        config.channel,
        receivers
    );
    Ok(receivers)
}

/// Resolve on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Unable to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!("Unable to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl+C received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
