//! The `Tool` trait and the error surface shared by every tool.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use pantry_core::DomainError;
use pantry_infra::ServiceError;

/// Metadata an agent host uses to advertise a tool to its model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDef {
    /// Stable dispatch id, e.g. `item_create`.
    pub id: &'static str,
    /// Human-readable title, e.g. `Create Item`.
    pub name: &'static str,
    pub description: &'static str,
    /// JSON-schema-style description of the expected arguments.
    pub input_schema: Value,
}

/// One agent-callable operation, bound to the service it drives.
#[async_trait]
pub trait Tool: Send + Sync {
    fn def(&self) -> &ToolDef;

    /// Run the tool against raw JSON arguments from the agent host.
    async fn call(&self, args: Value) -> Result<Value, ToolError>;
}

/// Failures a tool call can surface to the agent host.
///
/// `UnknownTool` and `InvalidArgs` are host-side mistakes; `Service` carries
/// the same domain and storage failures the HTTP layer reports.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid tool arguments: {0}")]
    InvalidArgs(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("result encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<DomainError> for ToolError {
    fn from(value: DomainError) -> Self {
        ToolError::Service(value.into())
    }
}

/// Deserialize tool arguments, reporting failures as `InvalidArgs`.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArgs(e.to_string()))
}
