//! Prometheus metrics registry for the ticker price worker.
//!
//! [`AppMetrics`] owns all registered metrics and the [`Registry`] they
//! belong to. Construct it once at startup, wrap in `Arc`, and pass it
//! to the processor, the subscriber loop and the HTTP middleware.
//!
//! Exposed at `GET /metrics` in Prometheus text exposition format
//! (`text/plain; version=0.0.4`). Labels never carry ticker symbols, so
//! series cardinality stays fixed.

use prometheus::{CounterVec, Gauge, Histogram, HistogramOpts, HistogramVec, Opts, Registry};

pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// All application-level Prometheus metrics.
pub struct AppMetrics {
    /// Pub/Sub messages handled, labelled by outcome (`processed`, `ignored`, `failed`).
    pub messages_processed_total: CounterVec,
    /// Ticker pipeline runs, labelled by `success`, `partial` or `failed`.
    pub ticker_updates_total: CounterVec,
    /// Market data calls, labelled by endpoint (`quote`, `profile`) and status.
    pub market_data_calls_total: CounterVec,
    /// Database writes, labelled by table and status.
    pub database_writes_total: CounterVec,
    /// 1 while the subscriber holds a live subscription, else 0.
    pub active_subscriptions: Gauge,
    /// Errors by component (`subscriber`, `processor`).
    pub worker_errors_total: CounterVec,
    /// Time spent processing one ticker end to end.
    pub processing_duration: Histogram,
    /// HTTP request count, labelled by method, path, and status code.
    pub http_requests_total: CounterVec,
    /// HTTP request latency histogram in seconds, labelled by path.
    pub http_request_duration: HistogramVec,
    /// The registry that owns all of the above metrics.
    pub registry: Registry,
}

impl AppMetrics {
    /// Create and register all metrics. Returns an error if any metric
    /// name is invalid or duplicated (should not happen in practice).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let messages_processed_total = CounterVec::new(
            Opts::new(
                "ticker_worker_messages_processed_total",
                "Pub/Sub messages handled by outcome",
            ),
            &["status"],
        )?;

        let ticker_updates_total = CounterVec::new(
            Opts::new(
                "ticker_worker_ticker_updates_total",
                "Ticker processing runs by outcome",
            ),
            &["status"],
        )?;

        let market_data_calls_total = CounterVec::new(
            Opts::new(
                "ticker_worker_market_data_calls_total",
                "Market data API calls by endpoint and status",
            ),
            &["endpoint", "status"],
        )?;

        let database_writes_total = CounterVec::new(
            Opts::new(
                "ticker_worker_database_writes_total",
                "Database write operations by table and status",
            ),
            &["table", "status"],
        )?;

        let active_subscriptions = Gauge::with_opts(Opts::new(
            "ticker_worker_active_subscriptions",
            "Number of active Pub/Sub subscriptions",
        ))?;

        let worker_errors_total = CounterVec::new(
            Opts::new("ticker_worker_errors_total", "Worker errors by component"),
            &["component"],
        )?;

        let processing_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ticker_worker_processing_duration_seconds",
                "Time spent fetching and storing one ticker update",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )?;

        let http_requests_total = CounterVec::new(
            Opts::new(
                "ticker_worker_http_requests_total",
                "HTTP requests by method, path, and status",
            ),
            &["method", "path", "status"],
        )?;

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "ticker_worker_http_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["path"],
        )?;

        registry.register(Box::new(messages_processed_total.clone()))?;
        registry.register(Box::new(ticker_updates_total.clone()))?;
        registry.register(Box::new(market_data_calls_total.clone()))?;
        registry.register(Box::new(database_writes_total.clone()))?;
        registry.register(Box::new(active_subscriptions.clone()))?;
        registry.register(Box::new(worker_errors_total.clone()))?;
        registry.register(Box::new(processing_duration.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            messages_processed_total,
            ticker_updates_total,
            market_data_calls_total,
            database_writes_total,
            active_subscriptions,
            worker_errors_total,
            processing_duration,
            http_requests_total,
            http_request_duration,
            registry,
        })
    }

    /// Render all metrics as Prometheus text format (for the `/metrics` endpoint).
    pub fn render(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&metric_families, &mut buf)?;
        String::from_utf8(buf).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_metrics_register_without_error() {
        let metrics = AppMetrics::new();
        assert!(metrics.is_ok(), "AppMetrics::new() failed: {:?}", metrics.err());
    }

    #[test]
    fn labelled_counters_increment_independently() {
        let metrics = AppMetrics::new().unwrap();
        metrics.ticker_updates_total.with_label_values(&["success"]).inc_by(2.0);
        metrics.ticker_updates_total.with_label_values(&["failed"]).inc();

        let success = metrics.ticker_updates_total.with_label_values(&["success"]).get();
        let failed = metrics.ticker_updates_total.with_label_values(&["failed"]).get();
        assert!((success - 2.0).abs() < f64::EPSILON);
        assert!((failed - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gauge_set_and_get() {
        let metrics = AppMetrics::new().unwrap();
        metrics.active_subscriptions.set(1.0);
        assert!((metrics.active_subscriptions.get() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn render_contains_metric_names_after_use() {
        let metrics = AppMetrics::new().unwrap();
        metrics.messages_processed_total.with_label_values(&["processed"]).inc();
        metrics
            .database_writes_total
            .with_label_values(&["ticker_prices", "success"])
            .inc();
        metrics.processing_duration.observe(0.2);
        metrics.http_request_duration.with_label_values(&["/healthz"]).observe(0.001);

        let output = metrics.render().unwrap();
        assert!(output.contains("ticker_worker_messages_processed_total{status=\"processed\"} 1"));
        assert!(output.contains("ticker_worker_database_writes_total"));
        assert!(output.contains("ticker_worker_processing_duration_seconds"));
        assert!(output.contains("ticker_worker_http_request_duration_seconds"));
        assert!(output.contains("ticker_worker_active_subscriptions 0"));
    }
}
