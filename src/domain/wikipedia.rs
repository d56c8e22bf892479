//! Wikipedia lookup tools
//!
//! Provides `wikipedia_search` and `wikipedia_get_content` on top of a
//! `WikipediaSource`. Upstream failures are reported as readable text results,
//! never as JSON-RPC errors.

use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::{macros, schema::Tool};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::catalog::{parse_arguments, ToolCatalog};
use crate::domain::text::{
    collapse_blank_lines, normalize_argument, truncate_chars, wikipedia_article_url,
};
use crate::errors::AppError;
use crate::upstream::wikipedia::{PageExtract, SearchHit, WikipediaSource};

pub const SERVER_NAME: &str = "wikipedia-mcp-server";

pub const DEFAULT_SEARCH_LIMIT: u32 = 5;
pub const MAX_SEARCH_LIMIT: u32 = 20;
pub const DEFAULT_MAX_CHARS: usize = 4_000;
pub const MIN_MAX_CHARS: usize = 200;
pub const MAX_MAX_CHARS: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WikipediaTool {
    Search,
    GetContent,
}

impl WikipediaTool {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "wikipedia_search" => Some(Self::Search),
            "wikipedia_get_content" => Some(Self::GetContent),
            _ => None,
        }
    }
}

#[macros::mcp_tool(
    name = "wikipedia_search",
    description = "Search Wikipedia for articles matching a query"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct WikipediaSearchTool {
    /// Search terms, e.g. "University of Oklahoma"
    pub query: String,
    /// Maximum number of articles to return (1-20, default 5)
    pub limit: Option<u32>,
}

#[macros::mcp_tool(
    name = "wikipedia_get_content",
    description = "Get the plain-text content of a Wikipedia article by title"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct WikipediaGetContentTool {
    /// Exact article title, e.g. "Norman, Oklahoma"
    pub title: String,
    /// Maximum characters of article text to return (200-20000, default 4000)
    pub max_chars: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GetContentParams {
    pub title: Option<String>,
    pub max_chars: Option<u32>,
}

pub struct WikipediaCatalog {
    source: Arc<dyn WikipediaSource>,
}

impl WikipediaCatalog {
    pub fn new(source: Arc<dyn WikipediaSource>) -> Self {
        Self { source }
    }

    pub async fn search(&self, params: SearchParams) -> String {
        let Some(query) = normalize_argument(params.query) else {
            return "Please provide a search query for Wikipedia.".to_string();
        };
        let limit = params
            .limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);

        match self.source.search(&query, limit).await {
            Ok(hits) if hits.is_empty() => format!("No Wikipedia articles found for \"{query}\"."),
            Ok(hits) => format_search_results(&query, &hits),
            Err(err) => {
                warn!(error = %err, query = %query, "wikipedia search failed");
                format!(
                    "Could not retrieve Wikipedia search results for \"{query}\". Please try again later."
                )
            }
        }
    }

    pub async fn get_content(&self, params: GetContentParams) -> String {
        let Some(title) = normalize_argument(params.title) else {
            return "Please provide an article title for Wikipedia.".to_string();
        };
        let max_chars = params
            .max_chars
            .map(|value| value as usize)
            .unwrap_or(DEFAULT_MAX_CHARS)
            .clamp(MIN_MAX_CHARS, MAX_MAX_CHARS);

        match self.source.extract(&title).await {
            Ok(Some(page)) => format_article(&page, max_chars),
            Ok(None) => format!("No Wikipedia article found titled \"{title}\"."),
            Err(err) => {
                warn!(error = %err, title = %title, "wikipedia content lookup failed");
                format!("Could not retrieve Wikipedia content for \"{title}\". Please try again later.")
            }
        }
    }
}

#[async_trait]
impl ToolCatalog for WikipediaCatalog {
    fn server_name(&self) -> &'static str {
        SERVER_NAME
    }

    fn tools(&self) -> Vec<Tool> {
        vec![WikipediaSearchTool::tool(), WikipediaGetContentTool::tool()]
    }

    fn has_tool(&self, name: &str) -> bool {
        WikipediaTool::from_name(name).is_some()
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<String, AppError> {
        let Some(tool) = WikipediaTool::from_name(name) else {
            return Err(AppError::tool_not_found(name));
        };

        match tool {
            WikipediaTool::Search => Ok(self.search(parse_arguments(arguments)?).await),
            WikipediaTool::GetContent => Ok(self.get_content(parse_arguments(arguments)?).await),
        }
    }
}

pub fn format_search_results(query: &str, hits: &[SearchHit]) -> String {
    let mut text = format!(
        "Found {} Wikipedia article(s) for \"{query}\":\n",
        hits.len()
    );

    for (index, hit) in hits.iter().enumerate() {
        text.push_str(&format!("\n{}. {}\n", index + 1, hit.title));
        if let Some(description) = hit.description.as_deref() {
            text.push_str(&format!("   {description}\n"));
        }
        text.push_str(&format!("   {}\n", hit.url));
    }

    text.trim_end().to_string()
}

pub fn format_article(page: &PageExtract, max_chars: usize) -> String {
    let url = wikipedia_article_url(&page.title);
    let body = collapse_blank_lines(&page.extract);
    let (body, truncated) = truncate_chars(&body, max_chars);

    let mut text = format!("# {}\n\n{body}", page.title);
    if truncated {
        text.push_str(&format!("...\n\n[Content truncated. Read more: {url}]"));
    }
    text.push_str(&format!("\n\nSource: {url}"));
    text
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct MockSource {
        calls: AtomicUsize,
        fail: bool,
        hits: Vec<SearchHit>,
        page: Option<PageExtract>,
    }

    #[async_trait]
    impl WikipediaSource for MockSource {
        async fn search(&self, _query: &str, limit: u32) -> Result<Vec<SearchHit>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::upstream("connection refused"));
            }
            Ok(self.hits.iter().take(limit as usize).cloned().collect())
        }

        async fn extract(&self, _title: &str) -> Result<Option<PageExtract>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::upstream("connection refused"));
            }
            Ok(self.page.clone())
        }
    }

    fn hit(title: &str, description: Option<&str>) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            description: description.map(str::to_string),
            url: wikipedia_article_url(title),
        }
    }

    fn arguments(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn search_without_query_prompts_without_calling_upstream() {
        let source = Arc::new(MockSource::default());
        let catalog = WikipediaCatalog::new(source.clone());

        let text = catalog
            .call_tool("wikipedia_search", Map::new())
            .await
            .expect("tool call succeeds");

        assert_eq!(text, "Please provide a search query for Wikipedia.");
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_formats_numbered_results() {
        let source = Arc::new(MockSource {
            hits: vec![
                hit("Oklahoma", Some("U.S. state")),
                hit("Oklahoma City", None),
            ],
            ..Default::default()
        });
        let catalog = WikipediaCatalog::new(source);

        let text = catalog
            .call_tool("wikipedia_search", arguments(json!({"query": "Oklahoma"})))
            .await
            .expect("tool call succeeds");

        assert!(text.starts_with("Found 2 Wikipedia article(s) for \"Oklahoma\":"));
        assert!(text.contains("1. Oklahoma\n   U.S. state\n   https://en.wikipedia.org/wiki/Oklahoma"));
        assert!(text.contains("2. Oklahoma City\n   https://en.wikipedia.org/wiki/Oklahoma_City"));
    }

    #[tokio::test]
    async fn search_limit_is_clamped() {
        let source = Arc::new(MockSource {
            hits: (0..30).map(|index| hit(&format!("Article {index}"), None)).collect(),
            ..Default::default()
        });
        let catalog = WikipediaCatalog::new(source);

        let text = catalog
            .search(SearchParams {
                query: Some("Article".to_string()),
                limit: Some(500),
            })
            .await;

        assert!(text.starts_with("Found 20 Wikipedia article(s)"));
    }

    #[tokio::test]
    async fn search_with_no_hits_reports_none_found() {
        let catalog = WikipediaCatalog::new(Arc::new(MockSource::default()));

        let text = catalog
            .call_tool("wikipedia_search", arguments(json!({"query": "zzqqxx"})))
            .await
            .expect("tool call succeeds");

        assert_eq!(text, "No Wikipedia articles found for \"zzqqxx\".");
    }

    #[tokio::test]
    async fn upstream_failure_is_reported_as_text() {
        let catalog = WikipediaCatalog::new(Arc::new(MockSource {
            fail: true,
            ..Default::default()
        }));

        let text = catalog
            .call_tool("wikipedia_search", arguments(json!({"query": "Oklahoma"})))
            .await
            .expect("upstream failure is not a protocol error");

        assert!(text.starts_with("Could not retrieve Wikipedia search results"));
    }

    #[tokio::test]
    async fn get_content_without_title_prompts() {
        let source = Arc::new(MockSource::default());
        let catalog = WikipediaCatalog::new(source.clone());

        let text = catalog
            .call_tool("wikipedia_get_content", arguments(json!({"title": "  "})))
            .await
            .expect("tool call succeeds");

        assert_eq!(text, "Please provide an article title for Wikipedia.");
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn get_content_reports_missing_page() {
        let catalog = WikipediaCatalog::new(Arc::new(MockSource::default()));

        let text = catalog
            .call_tool("wikipedia_get_content", arguments(json!({"title": "Nowhere Town"})))
            .await
            .expect("tool call succeeds");

        assert_eq!(text, "No Wikipedia article found titled \"Nowhere Town\".");
    }

    #[tokio::test]
    async fn get_content_truncates_long_articles() {
        let catalog = WikipediaCatalog::new(Arc::new(MockSource {
            page: Some(PageExtract {
                title: "Norman, Oklahoma".to_string(),
                extract: "word ".repeat(200),
            }),
            ..Default::default()
        }));

        let text = catalog
            .get_content(GetContentParams {
                title: Some("Norman, Oklahoma".to_string()),
                max_chars: Some(200),
            })
            .await;

        assert!(text.starts_with("# Norman, Oklahoma\n\nword word"));
        assert!(text.contains(
            "[Content truncated. Read more: https://en.wikipedia.org/wiki/Norman,_Oklahoma]"
        ));
        assert!(text.ends_with("Source: https://en.wikipedia.org/wiki/Norman,_Oklahoma"));
    }

    #[tokio::test]
    async fn mistyped_arguments_are_invalid_params() {
        let catalog = WikipediaCatalog::new(Arc::new(MockSource::default()));

        let error = catalog
            .call_tool("wikipedia_search", arguments(json!({"query": 42})))
            .await
            .expect_err("numeric query must be rejected");

        assert!(matches!(error, AppError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn unknown_tool_makes_no_upstream_call() {
        let source = Arc::new(MockSource::default());
        let catalog = WikipediaCatalog::new(source.clone());

        let error = catalog
            .call_tool("wikipedia_delete", Map::new())
            .await
            .expect_err("unknown tool must fail");

        assert!(matches!(error, AppError::ToolNotFound { .. }));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn tool_catalog_is_static() {
        let catalog = WikipediaCatalog::new(Arc::new(MockSource::default()));
        assert_eq!(
            catalog.tool_names(),
            vec!["wikipedia_search", "wikipedia_get_content"]
        );
    }
}
