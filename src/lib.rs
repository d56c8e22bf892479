use std::sync::Arc;

use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod keepalive;
pub mod logging;
pub mod mcp;
pub mod upstream;

use config::Config;
use domain::catalog::ToolCatalog;

#[derive(Clone)]
pub struct AppState {
    pub auth_key: Arc<str>,
    pub catalog: Arc<dyn ToolCatalog>,
}

impl AppState {
    pub fn new(auth_key: String, catalog: Arc<dyn ToolCatalog>) -> Self {
        Self {
            auth_key: Arc::<str>::from(auth_key),
            catalog,
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(http::handlers::status))
        .route("/health", get(http::handlers::health))
        .merge(protected)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .layer(cors)
        .with_state(state)
}

/// Binds the configured socket and serves `catalog` until the process exits.
pub async fn serve(
    config: Config,
    catalog: Arc<dyn ToolCatalog>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bind_socket = config.bind_socket()?;
    let server_name = catalog.server_name();

    if let Some(url) = config.keepalive_url.clone() {
        let http = upstream::build_http_client(config.upstream_timeout)?;
        keepalive::spawn_keepalive(http, url, config.keepalive_interval);
    }

    let state = AppState::new(config.auth_key.clone(), catalog);
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        server = server_name,
        bind_addr = %config.bind_addr,
        port = config.port,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
