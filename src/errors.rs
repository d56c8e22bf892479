use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::mcp::rpc::app_error_to_json_rpc;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized: {message}")]
    Unauthorized {
        code: &'static str,
        message: &'static str,
    },
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
    #[error("invalid params: {message}")]
    InvalidParams { message: String },
    #[error("tool not found: {name}")]
    ToolNotFound { name: String },
    #[error("upstream request failed: {message}")]
    Upstream { message: String },
    #[error("internal error")]
    Internal { message: String },
}

impl AppError {
    pub fn unauthorized(code: &'static str, message: &'static str) -> Self {
        Self::Unauthorized { code, message }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::upstream(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest { .. } | Self::InvalidParams { .. } => StatusCode::BAD_REQUEST,
            Self::ToolNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Upstream { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(app_error_to_json_rpc(None, self))).into_response()
    }
}
