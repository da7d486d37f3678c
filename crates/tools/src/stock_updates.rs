//! Stock-update tools: the four audit-trail operations exposed to agent hosts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use pantry_core::{ItemId, PageRequest, StockUpdateId, UserId};
use pantry_infra::StockUpdateService;
use pantry_inventory::{StockAdjustment, StockUpdateFilter, StockUpdateSort};

use crate::tool::{Tool, ToolDef, ToolError, parse_args};

/// `stock_update_create`
pub struct CreateStockUpdateTool {
    def: ToolDef,
    stock: StockUpdateService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStockUpdateArgs {
    owner_id: UserId,
    actor_name: String,
    #[serde(flatten)]
    adjustment: StockAdjustment,
}

impl CreateStockUpdateTool {
    pub fn new(stock: StockUpdateService) -> Self {
        Self {
            def: ToolDef {
                id: "stock_update_create",
                name: "Create Stock Update",
                description: "Create a new stock update and automatically update the item quantity",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "itemId": {"type": "string", "minLength": 1, "format": "uuid"},
                        "oldQuantity": {"type": "number", "minimum": 0},
                        "newQuantity": {"type": "number", "minimum": 0},
                        "notes": {"type": "string"},
                        "ownerId": {"type": "string", "format": "uuid"},
                        "actorName": {"type": "string"}
                    },
                    "required": ["itemId", "oldQuantity", "newQuantity", "ownerId", "actorName"]
                }),
            },
            stock,
        }
    }
}

#[async_trait]
impl Tool for CreateStockUpdateTool {
    fn def(&self) -> &ToolDef {
        &self.def
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: CreateStockUpdateArgs = parse_args(args)?;
        let update = self
            .stock
            .adjust_stock(args.adjustment, args.owner_id, &args.actor_name)
            .await?;
        Ok(serde_json::to_value(update)?)
    }
}

/// `stock_update_get_all`
pub struct GetAllStockUpdatesTool {
    def: ToolDef,
    stock: StockUpdateService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetAllStockUpdatesArgs {
    owner_id: UserId,
    #[serde(default)]
    item_id: Option<ItemId>,
    #[serde(default)]
    start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    sort_by: Option<String>,
}

impl GetAllStockUpdatesTool {
    pub fn new(stock: StockUpdateService) -> Self {
        Self {
            def: ToolDef {
                id: "stock_update_get_all",
                name: "Get All Stock Updates",
                description: "Get all stock updates with optional filters and pagination",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "itemId": {"type": "string", "format": "uuid"},
                        "startDate": {"type": "string", "format": "date-time"},
                        "endDate": {"type": "string", "format": "date-time"},
                        "page": {"type": "integer", "minimum": 1},
                        "limit": {"type": "integer", "minimum": 1, "maximum": 100},
                        "sortBy": {"type": "string"},
                        "ownerId": {"type": "string", "format": "uuid"}
                    },
                    "required": ["ownerId"]
                }),
            },
            stock,
        }
    }
}

#[async_trait]
impl Tool for GetAllStockUpdatesTool {
    fn def(&self) -> &ToolDef {
        &self.def
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: GetAllStockUpdatesArgs = parse_args(args)?;
        let filter = StockUpdateFilter {
            item_id: args.item_id,
            start_date: args.start_date,
            end_date: args.end_date,
        };
        let sort = StockUpdateSort::parse_or_default(args.sort_by.as_deref())?;
        let page = PageRequest::from_params(args.page, args.limit)?;
        let result = self
            .stock
            .list_stock_updates(args.owner_id, &filter, sort, page)
            .await?;
        Ok(serde_json::to_value(result)?)
    }
}

/// `stock_update_get_by_id`
pub struct GetStockUpdateByIdTool {
    def: ToolDef,
    stock: StockUpdateService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StockUpdateIdArgs {
    id: StockUpdateId,
    owner_id: UserId,
}

impl GetStockUpdateByIdTool {
    pub fn new(stock: StockUpdateService) -> Self {
        Self {
            def: ToolDef {
                id: "stock_update_get_by_id",
                name: "Get Stock Update By ID",
                description: "Get a single stock update by its ID",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "format": "uuid"},
                        "ownerId": {"type": "string", "format": "uuid"}
                    },
                    "required": ["id", "ownerId"]
                }),
            },
            stock,
        }
    }
}

#[async_trait]
impl Tool for GetStockUpdateByIdTool {
    fn def(&self) -> &ToolDef {
        &self.def
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: StockUpdateIdArgs = parse_args(args)?;
        let update = self.stock.get_stock_update(args.id, args.owner_id).await?;
        Ok(serde_json::to_value(update)?)
    }
}

/// `stock_update_get_by_item`
pub struct GetStockUpdatesByItemTool {
    def: ToolDef,
    stock: StockUpdateService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetStockUpdatesByItemArgs {
    item_id: ItemId,
    owner_id: UserId,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    sort_by: Option<String>,
}

impl GetStockUpdatesByItemTool {
    pub fn new(stock: StockUpdateService) -> Self {
        Self {
            def: ToolDef {
                id: "stock_update_get_by_item",
                name: "Get Stock Updates By Item",
                description: "Get all stock updates for a specific item with pagination",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "itemId": {"type": "string", "format": "uuid"},
                        "page": {"type": "integer", "minimum": 1},
                        "limit": {"type": "integer", "minimum": 1, "maximum": 100},
                        "sortBy": {"type": "string"},
                        "ownerId": {"type": "string", "format": "uuid"}
                    },
                    "required": ["itemId", "ownerId"]
                }),
            },
            stock,
        }
    }
}

#[async_trait]
impl Tool for GetStockUpdatesByItemTool {
    fn def(&self) -> &ToolDef {
        &self.def
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: GetStockUpdatesByItemArgs = parse_args(args)?;
        let sort = StockUpdateSort::parse_or_default(args.sort_by.as_deref())?;
        let page = PageRequest::from_params(args.page, args.limit)?;
        let result = self
            .stock
            .list_for_item(args.item_id, args.owner_id, sort, page)
            .await?;
        Ok(serde_json::to_value(result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_infra::{InMemoryInventoryStore, ItemService, ServiceError};
    use pantry_inventory::{Category, NewItem, Unit};
    use std::sync::Arc;

    fn services() -> (ItemService, StockUpdateService) {
        let store = Arc::new(InMemoryInventoryStore::new());
        (
            ItemService::new(store.clone()),
            StockUpdateService::new(store),
        )
    }

    fn rice(quantity: f64) -> NewItem {
        NewItem {
            name: "Basmati Rice".to_string(),
            category: Category::Rice,
            brand: None,
            quantity,
            unit: Unit::Kg,
            min_stock_level: 1.0,
            price: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_adjusts_the_item_and_returns_the_audit_row() {
        let (items, stock) = services();
        let owner = UserId::new();
        let item = items.create_item(rice(5.0), owner, "dana").await.unwrap();

        let tool = CreateStockUpdateTool::new(stock);
        let update = tool
            .call(json!({
                "itemId": item.id.to_string(),
                "oldQuantity": 5.0,
                "newQuantity": 3.5,
                "notes": "cooked biryani",
                "ownerId": owner.to_string(),
                "actorName": "sam",
            }))
            .await
            .unwrap();
        assert_eq!(update["newQuantity"], 3.5);
        assert_eq!(update["updatedBy"], "sam");

        let after = items.get_item(item.id, owner).await.unwrap();
        assert_eq!(after.quantity, 3.5);
    }

    #[tokio::test]
    async fn stale_claims_surface_the_conflict_message() {
        let (items, stock) = services();
        let owner = UserId::new();
        let item = items.create_item(rice(5.0), owner, "dana").await.unwrap();

        let tool = CreateStockUpdateTool::new(stock);
        let err = tool
            .call(json!({
                "itemId": item.id.to_string(),
                "oldQuantity": 2.0,
                "newQuantity": 1.0,
                "ownerId": owner.to_string(),
                "actorName": "sam",
            }))
            .await
            .unwrap_err();
        match err {
            ToolError::Service(ServiceError::Domain(e)) => {
                assert_eq!(
                    e.to_string(),
                    "Old quantity does not match current item quantity"
                );
            }
            other => panic!("expected a domain conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn by_item_returns_the_flattened_wire_shape() {
        let (items, stock) = services();
        let owner = UserId::new();
        let item = items.create_item(rice(5.0), owner, "dana").await.unwrap();
        stock
            .adjust_stock(
                StockAdjustment {
                    item_id: item.id,
                    old_quantity: 5.0,
                    new_quantity: 4.0,
                    notes: None,
                },
                owner,
                "dana",
            )
            .await
            .unwrap();

        let tool = GetStockUpdatesByItemTool::new(stock);
        let page = tool
            .call(json!({
                "itemId": item.id.to_string(),
                "ownerId": owner.to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(page["totalResults"], 1);
        let row = &page["results"][0];
        assert_eq!(row["oldQuantity"], 5.0);
        assert_eq!(row["item"]["name"], "Basmati Rice");
        assert!(row.get("update").is_none());
    }

    #[test]
    fn date_filters_parse_from_rfc3339_strings() {
        let args: GetAllStockUpdatesArgs = serde_json::from_value(json!({
            "ownerId": UserId::new().to_string(),
            "startDate": "2025-01-01T00:00:00Z",
            "endDate": "2025-01-31T23:59:59Z",
        }))
        .unwrap();
        assert!(args.start_date.unwrap() < args.end_date.unwrap());
        assert!(args.item_id.is_none());
    }
}
