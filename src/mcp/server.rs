//! The central Model Context Protocol engine
//!
//! Validates JSON-RPC envelopes, negotiates `initialize`, and routes `tools/*`
//! calls to the served `ToolCatalog`.

use rust_mcp_sdk::schema::{
    CallToolResult, ContentBlock, Implementation, InitializeResult, JsonrpcMessage,
    ListToolsResult, ServerCapabilities, ServerCapabilitiesTools, TextContent,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::mcp::rpc::{
    app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result,
    request_id_to_value, METHOD_NOT_FOUND,
};
use crate::{errors::AppError, AppState};

pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpMethod {
    Initialize,
    Initialized,
    Ping,
    ToolsList,
    ToolsCall,
}

impl McpMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "initialize" => Some(Self::Initialize),
            "notifications/initialized" => Some(Self::Initialized),
            "ping" => Some(Self::Ping),
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            _ => None,
        }
    }

    pub fn is_notification(self) -> bool {
        matches!(self, Self::Initialized)
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Handles a decoded request body, single message or batch. `None` means
/// nothing in the payload expects a JSON-RPC reply.
pub async fn handle_json_rpc_payload(state: &AppState, payload: Value) -> Option<Value> {
    let Value::Array(batch) = payload else {
        return handle_json_rpc_value(state, payload).await;
    };

    if batch.is_empty() {
        return Some(json!([app_error_to_json_rpc(
            None,
            AppError::invalid_request("batch must not be empty"),
        )]));
    }

    let mut responses = Vec::with_capacity(batch.len());
    for item in batch {
        if let Some(response) = handle_json_rpc_value(state, item).await {
            responses.push(response);
        }
    }

    if responses.is_empty() {
        None
    } else {
        Some(Value::Array(responses))
    }
}

/// Handles one JSON-RPC message. `None` means the message was a notification
/// and gets no JSON-RPC reply.
pub async fn handle_json_rpc_value(state: &AppState, payload: Value) -> Option<Value> {
    if !payload.is_object() {
        return Some(app_error_to_json_rpc(
            None,
            AppError::invalid_request("message must be a JSON object"),
        ));
    }

    let raw_id = payload.get("id").cloned();
    if payload.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return Some(app_error_to_json_rpc(
            raw_id,
            AppError::invalid_request("jsonrpc must be \"2.0\""),
        ));
    }

    let message: JsonrpcMessage = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(err) => {
            return Some(app_error_to_json_rpc(
                raw_id,
                AppError::invalid_request(format!("malformed message: {err}")),
            ))
        }
    };

    match message {
        JsonrpcMessage::Request(request) => {
            let id = request_id_to_value(request.id);
            let method = request.method.trim();
            if method.is_empty() {
                return Some(app_error_to_json_rpc(
                    Some(id),
                    AppError::invalid_request("method must not be empty"),
                ));
            }

            let mcp_method = McpMethod::from_name(method);
            if mcp_method.is_some_and(McpMethod::is_notification) {
                debug!(method = %method, "notification acknowledged");
                return None;
            }

            Some(
                handle_json_rpc_request(
                    state,
                    Some(id),
                    method,
                    mcp_method,
                    request.params.map(Value::Object),
                )
                .await,
            )
        }
        JsonrpcMessage::Notification(notification) => {
            debug!(method = %notification.method.trim(), "notification acknowledged");
            None
        }
        JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => {
            Some(app_error_to_json_rpc(
                raw_id,
                AppError::invalid_request("responses are not accepted by this server"),
            ))
        }
    }
}

pub async fn handle_json_rpc_request(
    state: &AppState,
    id: Option<Value>,
    method: &str,
    mcp_method: Option<McpMethod>,
    params: Option<Value>,
) -> Value {
    let audit_params = redact_audit_params(params.as_ref());

    let response = match mcp_method {
        Some(mcp_method) => match dispatch(state, mcp_method, params).await {
            Ok(result) => json_rpc_result(id, result),
            Err(err) => app_error_to_json_rpc(id, err),
        },
        None => json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
    };

    info!(
        method = %method,
        params = %audit_params,
        outcome = if is_json_rpc_error(&response) { "failure" } else { "success" },
        "mcp action audited"
    );

    response
}

async fn dispatch(
    state: &AppState,
    method: McpMethod,
    params: Option<Value>,
) -> Result<Value, AppError> {
    match method {
        McpMethod::Initialize => initialize_result(state, params.as_ref()),
        McpMethod::Initialized | McpMethod::Ping => Ok(json!({})),
        McpMethod::ToolsList => to_result_value(ListToolsResult {
            meta: None,
            next_cursor: None,
            tools: state.catalog.tools(),
        }),
        McpMethod::ToolsCall => handle_tools_call(state, params).await,
    }
}

async fn handle_tools_call(state: &AppState, params: Option<Value>) -> Result<Value, AppError> {
    let raw_params = params.ok_or_else(|| AppError::invalid_params("params are required"))?;
    let tool_call: ToolCallParams = serde_json::from_value(raw_params)
        .map_err(|err| AppError::invalid_params(format!("invalid tools/call params: {err}")))?;

    if !state.catalog.has_tool(&tool_call.name) {
        return Err(AppError::tool_not_found(tool_call.name));
    }

    let arguments = tool_arguments(tool_call.arguments)?;
    let text = state.catalog.call_tool(&tool_call.name, arguments).await?;

    to_result_value(CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(text, None, None))],
        is_error: None,
        meta: None,
        structured_content: None,
    })
}

fn tool_arguments(arguments: Option<Value>) -> Result<Map<String, Value>, AppError> {
    match arguments {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(AppError::invalid_params("arguments must be an object")),
    }
}

fn initialize_result(state: &AppState, params: Option<&Value>) -> Result<Value, AppError> {
    to_result_value(InitializeResult {
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools {
                list_changed: Some(false),
            }),
            ..Default::default()
        },
        instructions: None,
        meta: None,
        protocol_version: negotiate_protocol_version(params).to_string(),
        server_info: Implementation {
            name: state.catalog.server_name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: None,
            description: None,
            icons: vec![],
            website_url: None,
        },
    })
}

fn to_result_value<T: serde::Serialize>(result: T) -> Result<Value, AppError> {
    serde_json::to_value(result)
        .map_err(|err| AppError::internal(format!("result serialization failed: {err}")))
}

/// Echoes the client's protocol version when supported, otherwise offers the latest.
pub fn negotiate_protocol_version(params: Option<&Value>) -> &'static str {
    let offered = params
        .and_then(Value::as_object)
        .and_then(|object| object.get("protocolVersion"))
        .and_then(Value::as_str)
        .map(str::trim);

    offered
        .and_then(|offered| {
            SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .copied()
                .find(|version| *version == offered)
        })
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

pub fn redact_audit_params(params: Option<&Value>) -> Value {
    params.map(redact_audit_value).unwrap_or(Value::Null)
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "authorization" | "bearer" | "api_key" | "apikey" | "auth_key"
    ) || normalized.contains("token")
        || normalized.contains("secret")
        || normalized.contains("password")
        || normalized.contains("credential")
}
