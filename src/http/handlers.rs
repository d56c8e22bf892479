//! Axum HTTP handlers for the web server
//!
//! Provides the Model Context Protocol endpoint and the public status endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::mcp::rpc::{json_rpc_error, PARSE_ERROR};
use crate::mcp::server::handle_json_rpc_payload;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub mcp_endpoint: &'static str,
    pub tools: Vec<String>,
    pub timestamp: String,
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        name: state.catalog.server_name(),
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        mcp_endpoint: "/mcp",
        tools: state.catalog.tool_names(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn mcp_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => {
            return (
                StatusCode::OK,
                Json(json_rpc_error(None, PARSE_ERROR, "Parse error")),
            )
                .into_response()
        }
    };

    match handle_json_rpc_payload(&state, payload).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::OK.into_response(),
    }
}
