//! HTTP surface of the worker.
//!
//! Public routes: `/`, `/healthz`, `/metrics`. Everything under
//! `/latest-price`, `/trigger-update` and `/metadata` requires the
//! `X-Worker-Secret` header.

pub mod auth;
pub mod health;
pub mod prices;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::header,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::metrics::{AppMetrics, METRICS_CONTENT_TYPE};
use crate::repository::TickerRepository;
use crate::worker::TickerProcessor;

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<TickerRepository>,
    pub processor: Arc<TickerProcessor>,
    pub metrics: Arc<AppMetrics>,
    pub worker_secret: Arc<str>,
}

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/latest-price/:ticker", get(prices::latest_price))
        .route("/trigger-update/:ticker", post(prices::trigger_update))
        .route("/metadata/:ticker", get(prices::ticker_metadata))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_worker_secret,
        ));

    Router::new()
        .route("/", get(health::root))
        .route("/healthz", get(health::healthz))
        .route("/metrics", get(metrics_handler))
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_http_metrics,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn metrics_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], body).into_response())
}

/// Routes left out of the HTTP metrics: scrapes and liveness checks.
const UNTRACKED_PATHS: [&str; 2] = ["/metrics", "/healthz"];

/// Count and time every request by its route template, never the raw path.
async fn track_http_metrics(
    State(metrics): State<Arc<AppMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    if UNTRACKED_PATHS.contains(&path.as_str()) {
        return next.run(request).await;
    }

    let started = Instant::now();
    let response = next.run(request).await;

    metrics
        .http_request_duration
        .with_label_values(&[path.as_str()])
        .observe(started.elapsed().as_secs_f64());
    metrics
        .http_requests_total
        .with_label_values(&[method.as_str(), path.as_str(), response.status().as_str()])
        .inc();

    response
}
