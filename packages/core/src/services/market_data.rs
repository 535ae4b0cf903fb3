//! Market data source.
//!
//! [`MarketDataProvider`] abstracts where quotes and company profiles come
//! from; [`YahooFinanceClient`] is the production implementation backed by
//! the public Yahoo Finance chart and quoteSummary endpoints.
//!
//! quoteSummary only answers requests carrying a session cookie and the
//! matching `crumb` query parameter. The client primes the cookie once,
//! caches the crumb and refreshes it a single time when Yahoo answers 401.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{AppError, ProviderError};
use crate::ticker::normalize_ticker;

pub const DEFAULT_MARKET_DATA_URL: &str = "https://query1.finance.yahoo.com";

/// Any Yahoo page that hands out the session cookie; the status is irrelevant.
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Yahoo rejects requests without a browser-like agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Latest traded price for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: f64,
    pub volume: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

/// Descriptive company data for a symbol.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TickerProfile {
    pub symbol: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
}

/// Trait for market data providers to keep the pipeline source-independent
#[async_trait]
pub trait MarketDataProvider {
    /// Fetch the most recent price for `symbol`.
    async fn fetch_quote(&self, symbol: &str) -> Result<PriceQuote, ProviderError>;

    /// Fetch company name, sector, industry and market cap for `symbol`.
    async fn fetch_profile(&self, symbol: &str) -> Result<TickerProfile, ProviderError>;

    /// Get the name of this provider for logging/debugging
    fn provider_name(&self) -> &str;
}

#[derive(Clone)]
pub struct YahooFinanceClient {
    base_url: String,
    cookie_url: String,
    http: Client,
    crumb: Arc<Mutex<Option<String>>>,
}

impl YahooFinanceClient {
    pub fn new(base_url: String) -> Result<Self, AppError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .cookie_store(true)
            .build()
            .map_err(|err| AppError::Network(err.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            http,
            crumb: Arc::new(Mutex::new(None)),
        })
    }

    /// Override where the session cookie is fetched from.
    pub fn with_cookie_url(mut self, cookie_url: String) -> Self {
        self.cookie_url = cookie_url;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Cached crumb, or a fresh one when `refresh` is set or none is cached yet.
    async fn crumb(&self, refresh: bool) -> Result<String, ProviderError> {
        let mut cached = self.crumb.lock().await;
        if let (false, Some(crumb)) = (refresh, cached.as_ref()) {
            return Ok(crumb.clone());
        }

        // Only the Set-Cookie header matters here.
        if let Err(err) = self.http.get(&self.cookie_url).send().await {
            tracing::warn!("Could not prime Yahoo session cookie: {}", err);
        }

        let response = self
            .http
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .send()
            .await
            .map_err(|err| ProviderError::Network {
                message: err.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimitExceeded);
        }
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
            });
        }

        let crumb = response
            .text()
            .await
            .map_err(|err| ProviderError::Format {
                message: err.to_string(),
            })?
            .trim()
            .to_string();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(ProviderError::Format {
                message: "unusable crumb in getcrumb response".to_string(),
            });
        }

        tracing::debug!("Obtained new Yahoo crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn get_summary(
        &self,
        url: &str,
        symbol: &str,
        crumb: &str,
    ) -> Result<QuoteSummaryEnvelope, ProviderError> {
        self.get_json(url, &[("modules", "price,assetProfile"), ("crumb", crumb)], symbol)
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        symbol: &str,
    ) -> Result<T, ProviderError> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| ProviderError::Network {
                message: err.to_string(),
            })?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(ProviderError::NoData {
                    symbol: symbol.to_string(),
                })
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(ProviderError::RateLimitExceeded),
            status => {
                return Err(ProviderError::Http {
                    status: status.as_u16(),
                })
            }
        }

        response
            .json::<T>()
            .await
            .map_err(|err| ProviderError::Format {
                message: err.to_string(),
            })
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<PriceQuote, ProviderError> {
        let symbol = checked_symbol(symbol)?;
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);

        let envelope: ChartEnvelope = self
            .get_json(&url, &[("range", "1d"), ("interval", "1d")], &symbol)
            .await?;

        let quote = envelope.into_quote(&symbol)?;
        tracing::debug!("Fetched price for {}: ${:.2}", symbol, quote.price);
        Ok(quote)
    }

    async fn fetch_profile(&self, symbol: &str) -> Result<TickerProfile, ProviderError> {
        let symbol = checked_symbol(symbol)?;
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);

        let crumb = self.crumb(false).await?;
        let envelope = match self.get_summary(&url, &symbol, &crumb).await {
            Err(ProviderError::Http { status: 401 }) => {
                tracing::debug!("Crumb rejected for {}, refreshing", symbol);
                let crumb = self.crumb(true).await?;
                self.get_summary(&url, &symbol, &crumb).await?
            }
            other => other?,
        };

        envelope.into_profile(&symbol)
    }

    fn provider_name(&self) -> &str {
        "yahoo-finance"
    }
}

fn checked_symbol(symbol: &str) -> Result<String, ProviderError> {
    normalize_ticker(symbol).ok_or_else(|| ProviderError::InvalidSymbol {
        symbol: symbol.to_string(),
    })
}

// ---- Yahoo wire format ----

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: Option<String>,
}

impl From<YahooError> for ProviderError {
    fn from(err: YahooError) -> Self {
        ProviderError::Upstream {
            code: err.code,
            description: err.description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_volume: Option<f64>,
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

impl ChartEnvelope {
    fn into_quote(self, symbol: &str) -> Result<PriceQuote, ProviderError> {
        if let Some(err) = self.chart.error {
            return Err(err.into());
        }

        let no_data = || ProviderError::NoData {
            symbol: symbol.to_string(),
        };

        let result = self
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(no_data)?;

        // Bar timestamps mark the session start, so the last-trade time wins.
        let market_time = result.meta.regular_market_time.and_then(unix_to_utc);

        if let Some((price, volume, bar_time)) = result.latest_bar() {
            return Ok(PriceQuote {
                symbol: symbol.to_string(),
                price,
                volume,
                observed_at: market_time
                    .or_else(|| bar_time.and_then(unix_to_utc))
                    .unwrap_or_else(Utc::now),
            });
        }

        let price = result.meta.regular_market_price.ok_or_else(no_data)?;
        Ok(PriceQuote {
            symbol: symbol.to_string(),
            price,
            volume: result.meta.regular_market_volume,
            observed_at: market_time.unwrap_or_else(Utc::now),
        })
    }
}

impl ChartResult {
    /// The newest bar with a close: `(close, volume, unix_time)`.
    fn latest_bar(&self) -> Option<(f64, Option<f64>, Option<i64>)> {
        let quote = self.indicators.as_ref()?.quote.first()?;

        quote
            .close
            .iter()
            .enumerate()
            .rev()
            .find_map(|(idx, &close)| {
                close.map(|price| {
                    let volume = quote.volume.get(idx).copied().flatten();
                    let time = self.timestamp.get(idx).copied();
                    (price, volume, time)
                })
            })
    }
}

fn unix_to_utc(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    result: Option<Vec<QuoteSummaryResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    price: Option<PriceModule>,
    asset_profile: Option<AssetProfileModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    market_cap: Option<RawNumber>,
}

#[derive(Debug, Deserialize)]
struct RawNumber {
    raw: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AssetProfileModule {
    sector: Option<String>,
    industry: Option<String>,
}

impl QuoteSummaryEnvelope {
    fn into_profile(self, symbol: &str) -> Result<TickerProfile, ProviderError> {
        if let Some(err) = self.quote_summary.error {
            return Err(err.into());
        }

        let result = self
            .quote_summary
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| ProviderError::NoData {
                symbol: symbol.to_string(),
            })?;

        let (company_name, market_cap) = match result.price {
            Some(price) => (
                price.long_name.or(price.short_name),
                price.market_cap.and_then(|cap| cap.raw),
            ),
            None => (None, None),
        };

        let (sector, industry) = match result.asset_profile {
            Some(profile) => (profile.sector, profile.industry),
            None => (None, None),
        };

        Ok(TickerProfile {
            symbol: symbol.to_string(),
            company_name,
            sector,
            industry,
            market_cap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    const CHART_OK: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "USD",
                    "symbol": "AAPL",
                    "regularMarketPrice": 189.98,
                    "regularMarketVolume": 51000000,
                    "regularMarketTime": 1718049600
                },
                "timestamp": [1717963200, 1718049600],
                "indicators": {
                    "quote": [{
                        "open": [191.0, 190.5],
                        "close": [191.5, null],
                        "volume": [48000000, null]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    const CHART_META_ONLY: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "regularMarketPrice": 42.5,
                    "regularMarketVolume": 1200,
                    "regularMarketTime": 1718049600
                },
                "indicators": { "quote": [{}] }
            }],
            "error": null
        }
    }"#;

    const CHART_NOT_FOUND: &str = r#"{
        "chart": {
            "result": null,
            "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
        }
    }"#;

    const SUMMARY_OK: &str = r#"{
        "quoteSummary": {
            "result": [{
                "price": {
                    "longName": "Apple Inc.",
                    "shortName": "Apple",
                    "marketCap": { "raw": 2950000000000, "fmt": "2.95T" }
                },
                "assetProfile": {
                    "sector": "Technology",
                    "industry": "Consumer Electronics"
                }
            }],
            "error": null
        }
    }"#;

    async fn client_for(server: &MockServer) -> YahooFinanceClient {
        YahooFinanceClient::new(server.uri())
            .unwrap()
            .with_cookie_url(format!("{}/session", server.uri()))
    }

    async fn mount_crumb(server: &MockServer, crumb: &str, times: u64) {
        Mock::given(method("GET"))
            .and(path("/v1/test/getcrumb"))
            .respond_with(ResponseTemplate::new(200).set_body_string(crumb))
            .expect(times)
            .mount(server)
            .await;
    }

    fn chart_body(price: f64, close: Option<f64>, bar_time: i64, market_time: Option<i64>) -> String {
        serde_json::json!({
            "chart": {
                "result": [{
                    "meta": { "regularMarketPrice": price, "regularMarketTime": market_time },
                    "timestamp": [bar_time],
                    "indicators": { "quote": [{ "close": [close], "volume": [null] }] }
                }],
                "error": null
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn fetch_quote_uses_latest_bar_with_a_close() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .and(query_param("range", "1d"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(CHART_OK, "application/json"))
            .mount(&server)
            .await;

        let quote = client_for(&server).await.fetch_quote("aapl").await.unwrap();

        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, 191.5);
        assert_eq!(quote.volume, Some(48_000_000.0));
        // Last-trade time, not the bar's session start.
        assert_eq!(quote.observed_at.timestamp(), 1_718_049_600);
    }

    #[tokio::test]
    async fn later_fetch_in_same_session_is_stamped_later() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        // Session bar without a close yet: meta fallback.
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                chart_body(100.0, None, 1_718_026_200, Some(1_718_049_540)),
                "application/json",
            ))
            .mount(&server)
            .await;
        let first = client.fetch_quote("AAPL").await.unwrap();

        server.reset().await;

        // Same session, bar now closed: bar path.
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                chart_body(101.0, Some(101.0), 1_718_026_200, Some(1_718_049_590)),
                "application/json",
            ))
            .mount(&server)
            .await;
        let second = client.fetch_quote("AAPL").await.unwrap();

        assert_eq!(first.price, 100.0);
        assert_eq!(second.price, 101.0);
        assert_eq!(first.observed_at.timestamp(), 1_718_049_540);
        assert_eq!(second.observed_at.timestamp(), 1_718_049_590);
        assert!(second.observed_at > first.observed_at);
    }

    #[tokio::test]
    async fn bar_time_is_used_when_market_time_is_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                chart_body(99.0, Some(99.5), 1_718_026_200, None),
                "application/json",
            ))
            .mount(&server)
            .await;

        let quote = client_for(&server).await.fetch_quote("AAPL").await.unwrap();

        assert_eq!(quote.price, 99.5);
        assert_eq!(quote.observed_at.timestamp(), 1_718_026_200);
    }

    #[tokio::test]
    async fn fetch_quote_falls_back_to_meta_price() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/XYZ"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(CHART_META_ONLY, "application/json"),
            )
            .mount(&server)
            .await;

        let quote = client_for(&server).await.fetch_quote("XYZ").await.unwrap();

        assert_eq!(quote.price, 42.5);
        assert_eq!(quote.volume, Some(1200.0));
        assert_eq!(quote.observed_at.timestamp(), 1_718_049_600);
    }

    #[tokio::test]
    async fn fetch_quote_maps_upstream_error_object() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/GONE"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(CHART_NOT_FOUND, "application/json"),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch_quote("GONE").await.unwrap_err();
        assert!(matches!(err, ProviderError::Upstream { ref code, .. } if code == "Not Found"));
    }

    #[tokio::test]
    async fn fetch_quote_maps_404_to_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch_quote("NOPE").await.unwrap_err();
        assert!(matches!(err, ProviderError::NoData { ref symbol } if symbol == "NOPE"));
    }

    #[tokio::test]
    async fn fetch_quote_maps_429_to_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch_quote("AAPL").await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn fetch_quote_maps_server_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch_quote("AAPL").await.unwrap_err();
        assert!(matches!(err, ProviderError::Http { status: 503 }));
    }

    #[tokio::test]
    async fn fetch_quote_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html>", "text/html"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch_quote("AAPL").await.unwrap_err();
        assert!(matches!(err, ProviderError::Format { .. }));
    }

    #[tokio::test]
    async fn fetch_quote_rejects_invalid_symbol_without_a_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch_quote("../admin").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidSymbol { .. }));
    }

    #[tokio::test]
    async fn fetch_profile_reads_price_and_asset_profile_modules() {
        let server = MockServer::start().await;
        mount_crumb(&server, "abc123", 1).await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/AAPL"))
            .and(query_param("modules", "price,assetProfile"))
            .and(query_param("crumb", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SUMMARY_OK, "application/json"))
            .mount(&server)
            .await;

        let profile = client_for(&server).await.fetch_profile("AAPL").await.unwrap();

        assert_eq!(profile.company_name.as_deref(), Some("Apple Inc."));
        assert_eq!(profile.sector.as_deref(), Some("Technology"));
        assert_eq!(profile.industry.as_deref(), Some("Consumer Electronics"));
        assert_eq!(profile.market_cap, Some(2_950_000_000_000.0));
    }

    #[tokio::test]
    async fn fetch_profile_tolerates_missing_modules() {
        let server = MockServer::start().await;
        mount_crumb(&server, "abc123", 1).await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/SPY"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"quoteSummary":{"result":[{"price":{"shortName":"Etf Trust","marketCap":{}}}],"error":null}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let profile = client_for(&server).await.fetch_profile("SPY").await.unwrap();

        assert_eq!(profile.company_name.as_deref(), Some("Etf Trust"));
        assert_eq!(profile.market_cap, None);
        assert_eq!(profile.sector, None);
    }

    #[tokio::test]
    async fn crumb_is_fetched_once_and_reused() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(404).insert_header("set-cookie", "A3=d=session; Path=/"))
            .expect(1)
            .mount(&server)
            .await;
        mount_crumb(&server, "abc123", 1).await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/AAPL"))
            .and(query_param("crumb", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SUMMARY_OK, "application/json"))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.fetch_profile("AAPL").await.unwrap();
        client.fetch_profile("AAPL").await.unwrap();
    }

    #[tokio::test]
    async fn rejected_crumb_is_refreshed_once() {
        let server = MockServer::start().await;
        mount_crumb(&server, "abc123", 2).await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/AAPL"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/AAPL"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(SUMMARY_OK, "application/json"))
            .mount(&server)
            .await;

        let profile = client_for(&server).await.fetch_profile("AAPL").await.unwrap();

        assert_eq!(profile.company_name.as_deref(), Some("Apple Inc."));
    }

    #[tokio::test]
    async fn persistent_crumb_rejection_is_an_http_error() {
        let server = MockServer::start().await;
        mount_crumb(&server, "abc123", 2).await;
        Mock::given(method("GET"))
            .and(path("/v10/finance/quoteSummary/AAPL"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let err = client_for(&server).await.fetch_profile("AAPL").await.unwrap_err();

        assert!(matches!(err, ProviderError::Http { status: 401 }));
    }

    #[tokio::test]
    async fn html_crumb_response_is_a_format_error() {
        let server = MockServer::start().await;
        mount_crumb(&server, "<html>consent</html>", 1).await;

        let err = client_for(&server).await.fetch_profile("AAPL").await.unwrap_err();

        assert!(matches!(err, ProviderError::Format { .. }));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = YahooFinanceClient::new("http://localhost:9999/".into()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9999");
    }
}
