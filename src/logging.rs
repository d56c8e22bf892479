use std::{str::FromStr, time::Instant};

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the `info` default.
pub fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(false);

    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().flatten_event(true).init(),
    }
}

pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started_at.elapsed().as_millis();

    // Health checks are too frequent to log.
    if path != "/health" {
        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = elapsed_ms,
            "request summary"
        );
    }

    if status.as_u16() == 401 {
        warn!(method = %method, path = %path, "authentication failure");
    } else if status.is_server_error() {
        error!(method = %method, path = %path, status = status.as_u16(), "request failed");
    }

    response
}
