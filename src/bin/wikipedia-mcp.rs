use std::sync::Arc;

use lookup_mcp::{
    config::Config,
    domain::wikipedia::WikipediaCatalog,
    logging, serve,
    upstream::{build_http_client, wikipedia::HttpWikipediaClient},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    logging::init_logging(config.log_format);

    let http = build_http_client(config.upstream_timeout)?;
    let source = HttpWikipediaClient::new(http, config.wikipedia_api_url.clone());
    info!(api_url = %config.wikipedia_api_url, "wikipedia source configured");

    serve(config, Arc::new(WikipediaCatalog::new(Arc::new(source)))).await
}
