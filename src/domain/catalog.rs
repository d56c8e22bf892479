use async_trait::async_trait;
use rust_mcp_sdk::schema::Tool;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::AppError;

/// A fixed set of tools served by one MCP endpoint.
#[async_trait]
pub trait ToolCatalog: Send + Sync {
    /// Name reported in `initialize` and on the status page.
    fn server_name(&self) -> &'static str;

    /// Static tool descriptors returned by `tools/list`.
    fn tools(&self) -> Vec<Tool>;

    fn tool_names(&self) -> Vec<String> {
        self.tools().into_iter().map(|tool| tool.name).collect()
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tool_names().iter().any(|tool| tool == name)
    }

    /// Runs the named tool. Unknown names must fail with
    /// `AppError::ToolNotFound` before any outbound request is made.
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>)
        -> Result<String, AppError>;
}

pub fn parse_arguments<T: DeserializeOwned>(arguments: Map<String, Value>) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|err| AppError::invalid_params(format!("invalid tool arguments: {err}")))
}
