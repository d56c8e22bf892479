//! Outbound HTTP clients for the third-party data sources

use std::time::Duration;

use crate::errors::AppError;

pub mod soonerstats;
pub mod wikipedia;

pub const USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
    " (MCP lookup server)"
);

pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|err| AppError::internal(format!("failed to build http client: {err}")))
}
