//! JSON-RPC envelope construction
//!
//! Maps internal `AppError`s onto JSON-RPC 2.0 error codes and builds result envelopes.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde_json::{json, Value};

use crate::errors::AppError;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn app_error_to_json_rpc(id: Option<Value>, err: AppError) -> Value {
    match err {
        AppError::Unauthorized { code, message } => json_rpc_error_with_data(
            id,
            INVALID_REQUEST,
            "Unauthorized",
            Some(json!({
                "code": code,
                "message": message,
            })),
        ),
        AppError::InvalidRequest { message } => json_rpc_error_with_data(
            id,
            INVALID_REQUEST,
            "Invalid Request",
            Some(json!({ "message": message })),
        ),
        AppError::InvalidParams { message } => json_rpc_error_with_data(
            id,
            INVALID_PARAMS,
            "Invalid params",
            Some(json!({ "message": message })),
        ),
        AppError::ToolNotFound { name } => json_rpc_error_with_data(
            id,
            METHOD_NOT_FOUND,
            "Method not found",
            Some(json!({
                "code": "tool_not_found",
                "message": "unknown tool name",
                "details": {
                    "name": name,
                },
            })),
        ),
        AppError::Upstream { message } | AppError::Internal { message } => {
            tracing::error!(error = %message, "mcp call failed with internal error");
            json_rpc_error(id, INTERNAL_ERROR, "Internal error")
        }
    }
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let error = RpcError {
        code: i64::from(code),
        data,
        message: message.to_string(),
    };

    match id.as_ref().and_then(value_to_request_id) {
        Some(request_id) => json!(JsonrpcErrorResponse::new(error, Some(request_id))),
        // Errors for requests whose id could not be read carry an explicit null id.
        None => json!({
            "jsonrpc": "2.0",
            "id": Value::Null,
            "error": error,
        }),
    }
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let extra = result.as_object().cloned();
        return json!(JsonrpcResultResponse::new(
            request_id,
            McpResult { meta: None, extra }
        ));
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

/// JSON-RPC ids are strings or integers; anything else is not echoed back.
pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}

pub fn request_id_to_value(id: RequestId) -> Value {
    match id {
        RequestId::String(value) => Value::String(value),
        RequestId::Integer(value) => Value::Number(value.into()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_without_id_serializes_null_id() {
        let value = json_rpc_error(None, INVALID_REQUEST, "Invalid Request");
        assert_eq!(
            value.to_string(),
            r#"{"error":{"code":-32600,"message":"Invalid Request"},"id":null,"jsonrpc":"2.0"}"#
        );
    }

    #[test]
    fn tool_not_found_maps_to_method_not_found() {
        let value = app_error_to_json_rpc(Some(json!(7)), AppError::tool_not_found("nope"));
        assert_eq!(value["id"], 7);
        assert_eq!(value["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(value["error"]["data"]["details"]["name"], "nope");
    }

    #[test]
    fn internal_errors_keep_the_request_id() {
        let value = app_error_to_json_rpc(Some(json!("abc")), AppError::internal("boom"));
        assert_eq!(value["id"], "abc");
        assert_eq!(value["error"]["code"], INTERNAL_ERROR);
        assert!(value["error"].get("data").is_none());
    }

    #[test]
    fn request_ids_are_strings_or_integers() {
        assert!(matches!(
            value_to_request_id(&json!(3)),
            Some(RequestId::Integer(3))
        ));
        assert!(matches!(
            value_to_request_id(&json!("x")),
            Some(RequestId::String(ref value)) if value == "x"
        ));
        assert!(value_to_request_id(&json!({"a": 1})).is_none());
        assert!(value_to_request_id(&json!(1.5)).is_none());
        assert_eq!(request_id_to_value(RequestId::Integer(7)), json!(7));
    }

    #[test]
    fn result_envelope_echoes_the_request_id() {
        let value = json_rpc_result(Some(json!("req-1")), json!({"tools": []}));
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], "req-1");
        assert_eq!(value["result"]["tools"], json!([]));
    }

    #[test]
    fn error_with_unusable_id_falls_back_to_null() {
        let value = json_rpc_error(Some(json!([1])), INVALID_REQUEST, "Invalid Request");
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], INVALID_REQUEST);
    }
}
