//! Item tools: the five item operations exposed to agent hosts.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use pantry_core::{ItemId, PageRequest, UserId};
use pantry_infra::ItemService;
use pantry_inventory::{Category, ItemFilter, ItemPatch, ItemSort, NewItem, StockLevel, Unit};

use crate::tool::{Tool, ToolDef, ToolError, parse_args};

fn category_values() -> Vec<&'static str> {
    Category::ALL.iter().map(|c| c.as_str()).collect()
}

fn unit_values() -> Vec<&'static str> {
    Unit::ALL.iter().map(|u| u.as_str()).collect()
}

fn stock_level_values() -> Vec<&'static str> {
    StockLevel::ALL.iter().map(|l| l.as_str()).collect()
}

/// `item_create`
pub struct CreateItemTool {
    def: ToolDef,
    items: ItemService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateItemArgs {
    owner_id: UserId,
    actor_name: String,
    #[serde(flatten)]
    item: NewItem,
}

impl CreateItemTool {
    pub fn new(items: ItemService) -> Self {
        Self {
            def: ToolDef {
                id: "item_create",
                name: "Create Item",
                description: "Create a new grocery item in inventory",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "minLength": 1},
                        "category": {"type": "string", "enum": category_values()},
                        "brand": {"type": "string"},
                        "quantity": {"type": "number", "minimum": 0},
                        "unit": {"type": "string", "enum": unit_values()},
                        "minStockLevel": {"type": "number", "minimum": 0},
                        "price": {"type": "number", "minimum": 0},
                        "notes": {"type": "string"},
                        "ownerId": {"type": "string", "format": "uuid"},
                        "actorName": {"type": "string"}
                    },
                    "required": ["name", "category", "quantity", "unit", "minStockLevel", "ownerId", "actorName"]
                }),
            },
            items,
        }
    }
}

#[async_trait]
impl Tool for CreateItemTool {
    fn def(&self) -> &ToolDef {
        &self.def
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: CreateItemArgs = parse_args(args)?;
        let item = self
            .items
            .create_item(args.item, args.owner_id, &args.actor_name)
            .await?;
        Ok(serde_json::to_value(item)?)
    }
}

/// `item_get_all`
pub struct GetAllItemsTool {
    def: ToolDef,
    items: ItemService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetAllItemsArgs {
    owner_id: UserId,
    #[serde(default)]
    category: Option<Category>,
    #[serde(default)]
    stock_level: Option<StockLevel>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    limit: Option<u32>,
    #[serde(default)]
    sort_by: Option<String>,
}

impl GetAllItemsTool {
    pub fn new(items: ItemService) -> Self {
        Self {
            def: ToolDef {
                id: "item_get_all",
                name: "Get All Items",
                description: "Get all grocery items with optional filters and pagination",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "category": {"type": "string", "enum": category_values()},
                        "stockLevel": {"type": "string", "enum": stock_level_values()},
                        "search": {"type": "string"},
                        "page": {"type": "integer", "minimum": 1},
                        "limit": {"type": "integer", "minimum": 1, "maximum": 100},
                        "sortBy": {"type": "string"},
                        "ownerId": {"type": "string", "format": "uuid"}
                    },
                    "required": ["ownerId"]
                }),
            },
            items,
        }
    }
}

#[async_trait]
impl Tool for GetAllItemsTool {
    fn def(&self) -> &ToolDef {
        &self.def
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: GetAllItemsArgs = parse_args(args)?;
        let filter = ItemFilter {
            category: args.category,
            stock_level: args.stock_level,
            search: args.search,
        };
        let sort = ItemSort::parse_or_default(args.sort_by.as_deref())?;
        let page = PageRequest::from_params(args.page, args.limit)?;
        let result = self
            .items
            .list_items(args.owner_id, &filter, sort, page)
            .await?;
        Ok(serde_json::to_value(result)?)
    }
}

/// `item_get_by_id`
pub struct GetItemByIdTool {
    def: ToolDef,
    items: ItemService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemIdArgs {
    id: ItemId,
    owner_id: UserId,
}

impl GetItemByIdTool {
    pub fn new(items: ItemService) -> Self {
        Self {
            def: ToolDef {
                id: "item_get_by_id",
                name: "Get Item By ID",
                description: "Get a single grocery item by its ID",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "format": "uuid"},
                        "ownerId": {"type": "string", "format": "uuid"}
                    },
                    "required": ["id", "ownerId"]
                }),
            },
            items,
        }
    }
}

#[async_trait]
impl Tool for GetItemByIdTool {
    fn def(&self) -> &ToolDef {
        &self.def
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: ItemIdArgs = parse_args(args)?;
        let item = self.items.get_item(args.id, args.owner_id).await?;
        Ok(serde_json::to_value(item)?)
    }
}

/// `item_update`
pub struct UpdateItemTool {
    def: ToolDef,
    items: ItemService,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateItemArgs {
    id: ItemId,
    owner_id: UserId,
    actor_name: String,
    #[serde(flatten)]
    patch: ItemPatch,
}

impl UpdateItemTool {
    pub fn new(items: ItemService) -> Self {
        Self {
            def: ToolDef {
                id: "item_update",
                name: "Update Item",
                description: "Update grocery item information by ID",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "format": "uuid"},
                        "name": {"type": "string", "minLength": 1},
                        "category": {"type": "string", "enum": category_values()},
                        "brand": {"type": "string"},
                        "quantity": {"type": "number", "minimum": 0},
                        "unit": {"type": "string", "enum": unit_values()},
                        "minStockLevel": {"type": "number", "minimum": 0},
                        "price": {"type": "number", "minimum": 0},
                        "notes": {"type": "string"},
                        "ownerId": {"type": "string", "format": "uuid"},
                        "actorName": {"type": "string"}
                    },
                    "required": ["id", "ownerId", "actorName"]
                }),
            },
            items,
        }
    }
}

#[async_trait]
impl Tool for UpdateItemTool {
    fn def(&self) -> &ToolDef {
        &self.def
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: UpdateItemArgs = parse_args(args)?;
        let item = self
            .items
            .update_item(args.id, args.patch, args.owner_id, &args.actor_name)
            .await?;
        Ok(serde_json::to_value(item)?)
    }
}

/// `item_delete`
pub struct DeleteItemTool {
    def: ToolDef,
    items: ItemService,
}

impl DeleteItemTool {
    pub fn new(items: ItemService) -> Self {
        Self {
            def: ToolDef {
                id: "item_delete",
                name: "Delete Item",
                description: "Delete a grocery item by its ID",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string", "format": "uuid"},
                        "ownerId": {"type": "string", "format": "uuid"}
                    },
                    "required": ["id", "ownerId"]
                }),
            },
            items,
        }
    }
}

#[async_trait]
impl Tool for DeleteItemTool {
    fn def(&self) -> &ToolDef {
        &self.def
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let args: ItemIdArgs = parse_args(args)?;
        let deleted = self.items.delete_item(args.id, args.owner_id).await?;
        Ok(json!({ "success": true, "deletedItem": deleted }))
    }
}
