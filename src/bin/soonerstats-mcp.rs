use std::sync::Arc;

use lookup_mcp::{
    config::Config,
    domain::soonerstats::SoonerStatsCatalog,
    logging, serve,
    upstream::{build_http_client, soonerstats::HttpSoonerStatsClient},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    logging::init_logging(config.log_format);

    let http = build_http_client(config.upstream_timeout)?;
    let source = HttpSoonerStatsClient::new(http, config.soonerstats_base_url.clone());
    info!(base_url = %config.soonerstats_base_url, "soonerstats source configured");

    serve(config, Arc::new(SoonerStatsCatalog::new(Arc::new(source)))).await
}
