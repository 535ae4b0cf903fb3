//! Ticker processing pipeline.
//!
//! [`TickerProcessor::process`] is the single linear sequence behind both
//! the subscriber loop and the manual trigger endpoint:
//! quote → profile → price row → metadata row.

use std::sync::Arc;

use serde::Serialize;

use crate::error::AppError;
use crate::metrics::AppMetrics;
use crate::repository::{NewTickerPrice, TickerRepository};
use crate::services::market_data::{MarketDataProvider, TickerProfile};

/// What a successful run wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessReport {
    pub ticker: String,
    pub price: f64,
    pub price_id: i64,
    /// `false` when the profile could not be fetched or stored.
    pub metadata_updated: bool,
}

pub struct TickerProcessor {
    provider: Arc<dyn MarketDataProvider + Send + Sync>,
    repository: Arc<TickerRepository>,
    metrics: Arc<AppMetrics>,
}

impl TickerProcessor {
    pub fn new(
        provider: Arc<dyn MarketDataProvider + Send + Sync>,
        repository: Arc<TickerRepository>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            provider,
            repository,
            metrics,
        }
    }

    /// Fetch and persist the current price of an already-normalised `ticker`.
    ///
    /// A quote or price-write failure aborts the run and nothing further is
    /// written. Profile problems only downgrade the run to a partial success.
    pub async fn process(&self, ticker: &str) -> Result<ProcessReport, AppError> {
        let _timer = self.metrics.processing_duration.start_timer();
        tracing::info!("Processing ticker: {}", ticker);

        let result = self.run_pipeline(ticker).await;

        let status = match &result {
            Ok(report) if report.metadata_updated => {
                tracing::info!("Successfully processed {}: ${:.2}", ticker, report.price);
                "success"
            }
            Ok(_) => {
                tracing::warn!("Partial success processing {}", ticker);
                "partial"
            }
            Err(err) => {
                tracing::error!("Failed to process {}: {}", ticker, err);
                self.metrics
                    .worker_errors_total
                    .with_label_values(&["processor"])
                    .inc();
                "failed"
            }
        };
        self.metrics.ticker_updates_total.with_label_values(&[status]).inc();

        result
    }

    async fn run_pipeline(&self, ticker: &str) -> Result<ProcessReport, AppError> {
        // 1. Quote (required)
        let quote = self.provider.fetch_quote(ticker).await;
        self.record_call("quote", quote.is_ok());
        let quote = quote?;

        // 2. Profile (best effort)
        let profile = match self.provider.fetch_profile(ticker).await {
            Ok(profile) => {
                self.record_call("profile", true);
                Some(profile)
            }
            Err(err) => {
                self.record_call("profile", false);
                tracing::warn!(
                    "Metadata unavailable for {} from {}: {}",
                    ticker,
                    self.provider.provider_name(),
                    err
                );
                None
            }
        };

        // 3. Price row (required)
        let new_price = NewTickerPrice {
            ticker: ticker.to_string(),
            price: quote.price,
            volume: quote.volume,
            market_cap: profile.as_ref().and_then(|p| p.market_cap),
            timestamp: quote.observed_at,
        };
        let price_id = self.repository.insert_price(&new_price).await;
        self.record_write("ticker_prices", price_id.is_ok());
        let price_id = price_id?;
        tracing::debug!("Stored price for {} in database (id {})", ticker, price_id);

        // 4. Metadata row (best effort)
        let metadata_updated = match profile {
            Some(profile) => self.store_metadata(ticker, profile).await,
            None => false,
        };

        Ok(ProcessReport {
            ticker: ticker.to_string(),
            price: quote.price,
            price_id,
            metadata_updated,
        })
    }

    async fn store_metadata(&self, ticker: &str, profile: TickerProfile) -> bool {
        // The stored row is keyed by the symbol we were asked about.
        let profile = TickerProfile {
            symbol: ticker.to_string(),
            ..profile
        };

        match self.repository.upsert_metadata(&profile).await {
            Ok(()) => {
                self.record_write("ticker_metadata", true);
                tracing::debug!("Updated metadata for {}", ticker);
                true
            }
            Err(err) => {
                self.record_write("ticker_metadata", false);
                tracing::error!("Error updating metadata for {}: {}", ticker, err);
                false
            }
        }
    }

    fn record_call(&self, endpoint: &str, ok: bool) {
        self.metrics
            .market_data_calls_total
            .with_label_values(&[endpoint, if ok { "success" } else { "error" }])
            .inc();
    }

    fn record_write(&self, table: &str, ok: bool) {
        self.metrics
            .database_writes_total
            .with_label_values(&[table, if ok { "success" } else { "error" }])
            .inc();
    }
}
