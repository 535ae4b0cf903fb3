use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::error::AppError;

pub const WORKER_SECRET_HEADER: &str = "x-worker-secret";

/// Reject requests whose `X-Worker-Secret` header does not match the configured secret.
pub async fn require_worker_secret(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorized = request
        .headers()
        .get(WORKER_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|secret| secret == &*state.worker_secret);

    if !authorized {
        tracing::warn!(
            "Rejected {} {}: missing or wrong worker secret",
            request.method(),
            request.uri().path()
        );
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
