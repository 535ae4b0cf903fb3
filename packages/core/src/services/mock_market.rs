//! In-memory [`MarketDataProvider`] for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::ProviderError;
use crate::services::market_data::{MarketDataProvider, PriceQuote, TickerProfile};

/// Serves canned quotes and profiles keyed by symbol. Symbols without a
/// configured response yield [`ProviderError::NoData`].
#[derive(Clone, Default)]
pub struct MockMarketData {
    quotes: HashMap<String, Result<PriceQuote, ProviderError>>,
    profiles: HashMap<String, Result<TickerProfile, ProviderError>>,
    quote_calls: Arc<AtomicUsize>,
    profile_calls: Arc<AtomicUsize>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, symbol: &str, price: f64, volume: Option<f64>) -> Self {
        let quote = PriceQuote {
            symbol: symbol.to_string(),
            price,
            volume,
            observed_at: Utc::now(),
        };
        self.quotes.insert(symbol.to_string(), Ok(quote));
        self
    }

    pub fn with_quote_error(mut self, symbol: &str, error: ProviderError) -> Self {
        self.quotes.insert(symbol.to_string(), Err(error));
        self
    }

    pub fn with_profile(mut self, profile: TickerProfile) -> Self {
        self.profiles.insert(profile.symbol.clone(), Ok(profile));
        self
    }

    pub fn with_profile_error(mut self, symbol: &str, error: ProviderError) -> Self {
        self.profiles.insert(symbol.to_string(), Err(error));
        self
    }

    /// Number of `fetch_quote` calls served so far.
    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketData {
    async fn fetch_quote(&self, symbol: &str) -> Result<PriceQuote, ProviderError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        self.quotes
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::NoData { symbol: symbol.to_string() }))
    }

    async fn fetch_profile(&self, symbol: &str) -> Result<TickerProfile, ProviderError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.profiles
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::NoData { symbol: symbol.to_string() }))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
