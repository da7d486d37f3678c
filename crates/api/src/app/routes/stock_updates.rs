use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use pantry_auth::{ITEMS_MANAGE, ITEMS_READ, Permission};
use pantry_core::StockUpdateId;
use pantry_infra::StockUpdateService;
use pantry_inventory::StockAdjustment;

use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_stock_updates).post(create_stock_update))
        .route("/:id", get(get_stock_update))
}

pub async fn create_stock_update(
    Extension(stock): Extension<StockUpdateService>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<StockAdjustment>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require_permission(&principal, &Permission::new(ITEMS_MANAGE)) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match stock
        .adjust_stock(body, principal.user_id(), principal.name())
        .await
    {
        Ok(update) => (StatusCode::CREATED, Json(update)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_stock_updates(
    Extension(stock): Extension<StockUpdateService>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ListStockUpdatesQuery>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require_permission(&principal, &Permission::new(ITEMS_READ)) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let (filter, sort, page) = match query.into_options() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match stock
        .list_stock_updates(principal.user_id(), &filter, sort, page)
        .await
    {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_stock_update(
    Extension(stock): Extension<StockUpdateService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require_permission(&principal, &Permission::new(ITEMS_READ)) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: StockUpdateId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match stock.get_stock_update(id, principal.user_id()).await {
        Ok(update) => Json(update).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
