use axum::Router;

pub mod items;
pub mod stock_updates;
pub mod system;

/// Router for all authenticated endpoints (mounted under `/v1`).
pub fn router() -> Router {
    Router::new()
        .nest("/items", items::router())
        .nest("/stock-updates", stock_updates::router())
}
