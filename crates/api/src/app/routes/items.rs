use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use pantry_auth::{ITEMS_MANAGE, ITEMS_READ, Permission};
use pantry_core::ItemId;
use pantry_infra::{ItemService, StockUpdateService};
use pantry_inventory::{ItemPatch, NewItem};

use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).patch(update_item).delete(delete_item))
        .route("/:id/stock-updates", get(list_item_stock_updates))
}

pub async fn create_item(
    Extension(items): Extension<ItemService>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<NewItem>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require_permission(&principal, &Permission::new(ITEMS_MANAGE)) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match items
        .create_item(body, principal.user_id(), principal.name())
        .await
    {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(items): Extension<ItemService>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ListItemsQuery>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require_permission(&principal, &Permission::new(ITEMS_READ)) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let (filter, sort, page) = match query.into_options() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match items
        .list_items(principal.user_id(), &filter, sort, page)
        .await
    {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(items): Extension<ItemService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require_permission(&principal, &Permission::new(ITEMS_READ)) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match items.get_item(id, principal.user_id()).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(items): Extension<ItemService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(patch): Json<ItemPatch>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require_permission(&principal, &Permission::new(ITEMS_MANAGE)) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match items
        .update_item(id, patch, principal.user_id(), principal.name())
        .await
    {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(items): Extension<ItemService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require_permission(&principal, &Permission::new(ITEMS_MANAGE)) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match items.delete_item(id, principal.user_id()).await {
        Ok(_deleted) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// History for one item, gated on the item itself (404/403 before any rows).
pub async fn list_item_stock_updates(
    Extension(stock): Extension<StockUpdateService>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::ListForItemQuery>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::require_permission(&principal, &Permission::new(ITEMS_READ)) {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let (sort, page) = match query.into_options() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match stock
        .list_for_item(id, principal.user_id(), sort, page)
        .await
    {
        Ok(page) => Json(page).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
