use axum::http::StatusCode;

/// Liveness probe. No auth, no body.
pub async fn health() -> StatusCode {
    StatusCode::OK
}
