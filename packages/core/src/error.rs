use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified application error.
///
/// This ensures all layers (config, network, database, broker, HTTP)
/// fail in a predictable and debuggable way.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Broker error: {0}")]
    Broker(#[from] redis::RedisError),

    #[error("Market data error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Invalid ticker symbol: {0:?}")]
    InvalidTicker(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,
}

/// Errors from market data providers
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Market data source returned HTTP {status}")]
    Http { status: u16 },

    #[error("Data format error: {message}")]
    Format { message: String },

    #[error("No price data available for {symbol}")]
    NoData { symbol: String },

    #[error("Invalid symbol: {symbol:?}")]
    InvalidSymbol { symbol: String },

    #[error("Upstream error {code}: {description}")]
    Upstream { code: String, description: String },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidTicker(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Provider(ProviderError::NoData { .. }) => StatusCode::NOT_FOUND,
            AppError::Provider(ProviderError::InvalidSymbol { .. }) => StatusCode::BAD_REQUEST,
            AppError::Provider(_) | AppError::Network(_) | AppError::Broker(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Config(_)
            | AppError::Parse(_)
            | AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details stay in the logs.
        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = AppError::NotFound("No price data found for AAPL".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn provider_no_data_maps_to_404_and_other_provider_errors_to_502() {
        let no_data = AppError::from(ProviderError::NoData { symbol: "ZZZZ".into() });
        assert_eq!(no_data.status_code(), StatusCode::NOT_FOUND);

        let limited = AppError::from(ProviderError::RateLimitExceeded);
        assert_eq!(limited.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn database_errors_are_internal() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn local_failures_are_internal_and_broker_failures_are_upstream() {
        for err in [
            AppError::Config("bad".into()),
            AppError::Parse("bad".into()),
            AppError::Metrics(prometheus::Error::Msg("bad".into())),
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR, "{}", err);
        }

        let broker = AppError::from(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "connection refused",
        )));
        assert_eq!(broker.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn display_includes_context() {
        let err = AppError::Config("DATABASE_URL is required".into());
        assert_eq!(err.to_string(), "Config error: DATABASE_URL is required");
    }
}
