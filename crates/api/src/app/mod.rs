//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: query DTOs and their mapping onto the typed domain options
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use pantry_auth::Hs256JwtValidator;
use pantry_infra::{InventoryStore, ItemService, StockUpdateService};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router over the given store (public entrypoint used by
/// `main.rs` and the black-box tests).
pub fn build_app(store: Arc<dyn InventoryStore>, jwt_secret: &str) -> Router {
    let jwt: Arc<dyn pantry_auth::JwtValidator> = Arc::new(Hs256JwtValidator::new(jwt_secret));
    let auth_state = middleware::AuthState { jwt };

    let items = ItemService::new(store.clone());
    let stock = StockUpdateService::new(store);

    // Protected routes: require a verified bearer token.
    let protected = routes::router()
        .layer(
            ServiceBuilder::new()
                .layer(Extension(items))
                .layer(Extension(stock)),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/v1", protected)
}
