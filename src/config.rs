use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;

use crate::logging::LogFormat;

pub const DEFAULT_WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
pub const DEFAULT_SOONERSTATS_BASE_URL: &str = "https://www.soonerstats.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub auth_key: String,
    pub bind_addr: String,
    pub port: u16,
    pub upstream_timeout: Duration,
    pub keepalive_url: Option<String>,
    pub keepalive_interval: Duration,
    pub wikipedia_api_url: String,
    pub soonerstats_base_url: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("MCP_AUTH_KEY is required and must not be empty")]
    MissingAuthKey,
    #[error("PORT must be a valid u16")]
    InvalidPort,
    #[error("UPSTREAM_TIMEOUT_SECS must be a positive integer")]
    InvalidTimeout,
    #[error("KEEPALIVE_INTERVAL_SECS must be a positive integer")]
    InvalidInterval,
    #[error("KEEPALIVE_URL must be an absolute http(s) URL")]
    InvalidKeepaliveUrl,
    #[error("LOG_FORMAT must be one of: compact, json")]
    InvalidLogFormat,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let auth_key = non_empty("MCP_AUTH_KEY").ok_or(ConfigError::MissingAuthKey)?;

        let bind_addr = non_empty("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = non_empty("PORT")
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(3000);
        let upstream_timeout = parse_positive_secs(
            non_empty("UPSTREAM_TIMEOUT_SECS"),
            10,
            ConfigError::InvalidTimeout,
        )?;
        let keepalive_interval = parse_positive_secs(
            non_empty("KEEPALIVE_INTERVAL_SECS"),
            840,
            ConfigError::InvalidInterval,
        )?;

        let keepalive_url = non_empty("KEEPALIVE_URL");
        if let Some(url) = keepalive_url.as_deref() {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidKeepaliveUrl);
            }
        }

        let wikipedia_api_url = non_empty("WIKIPEDIA_API_URL")
            .unwrap_or_else(|| DEFAULT_WIKIPEDIA_API_URL.to_string());
        let soonerstats_base_url = non_empty("SOONERSTATS_BASE_URL")
            .unwrap_or_else(|| DEFAULT_SOONERSTATS_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let log_format = non_empty("LOG_FORMAT")
            .map(|value| {
                value
                    .parse::<LogFormat>()
                    .map_err(|_| ConfigError::InvalidLogFormat)
            })
            .transpose()?
            .unwrap_or_default();

        let config = Self {
            auth_key,
            bind_addr,
            port,
            upstream_timeout,
            keepalive_url,
            keepalive_interval,
            wikipedia_api_url,
            soonerstats_base_url,
            log_format,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

fn parse_positive_secs(
    value: Option<String>,
    default_secs: u64,
    error: ConfigError,
) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(Duration::from_secs(default_secs)),
        Some(value) => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(error),
        },
    }
}
