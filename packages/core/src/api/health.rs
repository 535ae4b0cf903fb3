use axum::{
    http::{header, HeaderValue},
    response::IntoResponse,
    Json,
};
use serde_json::json;

pub const SERVICE_NAME: &str = "ticker-price-worker";

pub async fn healthz() -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))],
        Json(json!({ "status": "ok", "service": SERVICE_NAME })),
    )
}

/// Service description. Also answers `HEAD /`.
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "description": "Async worker for processing ticker price updates",
        "endpoints": {
            "health": "/healthz",
            "metrics": "/metrics",
            "latest_price": "/latest-price/{ticker}",
            "trigger_update": "/trigger-update/{ticker}",
            "metadata": "/metadata/{ticker}"
        },
        "status": "running"
    }))
}
