//! Tool registration: lookup and dispatch by stable id.

use std::sync::Arc;

use serde_json::Value;

use pantry_infra::{ItemService, StockUpdateService};

use crate::items::{
    CreateItemTool, DeleteItemTool, GetAllItemsTool, GetItemByIdTool, UpdateItemTool,
};
use crate::stock_updates::{
    CreateStockUpdateTool, GetAllStockUpdatesTool, GetStockUpdateByIdTool,
    GetStockUpdatesByItemTool,
};
use crate::tool::{Tool, ToolDef, ToolError};

/// All nine tools, dispatchable by id.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Register the five item tools and the four stock-update tools.
    pub fn new(items: ItemService, stock: StockUpdateService) -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(CreateItemTool::new(items.clone())),
            Arc::new(GetAllItemsTool::new(items.clone())),
            Arc::new(GetItemByIdTool::new(items.clone())),
            Arc::new(UpdateItemTool::new(items.clone())),
            Arc::new(DeleteItemTool::new(items)),
            Arc::new(CreateStockUpdateTool::new(stock.clone())),
            Arc::new(GetAllStockUpdatesTool::new(stock.clone())),
            Arc::new(GetStockUpdateByIdTool::new(stock.clone())),
            Arc::new(GetStockUpdatesByItemTool::new(stock)),
        ];
        Self { tools }
    }

    /// Definitions in registration order, ready to advertise to a model.
    pub fn defs(&self) -> Vec<&ToolDef> {
        self.tools.iter().map(|t| t.def()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.def().id == id)
            .map(|t| t.as_ref())
    }

    /// Dispatch one call. Unknown ids fail before any service is touched.
    pub async fn dispatch(&self, id: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .get(id)
            .ok_or_else(|| ToolError::UnknownTool(id.to_string()))?;
        tool.call(args).await
    }
}
