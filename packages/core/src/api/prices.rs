use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::AppState;
use crate::error::AppError;
use crate::repository::{TickerMetadata, TickerPrice};
use crate::ticker::normalize_ticker;
use crate::worker::ProcessReport;

#[derive(Debug, Serialize)]
pub struct TriggerUpdateResponse {
    pub message: String,
    pub status: &'static str,
    #[serde(flatten)]
    pub report: ProcessReport,
}

fn path_ticker(raw: &str) -> Result<String, AppError> {
    normalize_ticker(raw).ok_or_else(|| AppError::InvalidTicker(raw.to_string()))
}

/// `GET /latest-price/:ticker`
pub async fn latest_price(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<TickerPrice>, AppError> {
    let ticker = path_ticker(&ticker)?;

    state
        .repository
        .latest_price(&ticker)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No price data found for {}", ticker)))
}

/// `POST /trigger-update/:ticker`
///
/// Runs the same pipeline as a Pub/Sub message, synchronously, and reports
/// what was written.
pub async fn trigger_update(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<TriggerUpdateResponse>, AppError> {
    let ticker = path_ticker(&ticker)?;
    tracing::info!("Manual update triggered for {}", ticker);

    let report = state.processor.process(&ticker).await?;

    Ok(Json(TriggerUpdateResponse {
        message: format!("Update triggered for {}", ticker),
        status: "success",
        report,
    }))
}

/// `GET /metadata/:ticker`
pub async fn ticker_metadata(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<TickerMetadata>, AppError> {
    let ticker = path_ticker(&ticker)?;

    state
        .repository
        .get_metadata(&ticker)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No metadata found for {}", ticker)))
}
