use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageExtract {
    pub title: String,
    pub extract: String,
}

#[async_trait]
pub trait WikipediaSource: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>, AppError>;

    /// `Ok(None)` when the page does not exist or has no text.
    async fn extract(&self, title: &str) -> Result<Option<PageExtract>, AppError>;
}

#[derive(Debug, Clone)]
pub struct HttpWikipediaClient {
    http: reqwest::Client,
    api_url: String,
}

impl HttpWikipediaClient {
    pub fn new(http: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
        }
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> Result<Value, AppError> {
        let response = self
            .http
            .get(&self.api_url)
            .query(params)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl WikipediaSource for HttpWikipediaClient {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>, AppError> {
        let limit = limit.to_string();
        let payload = self
            .get_json(&[
                ("action", "opensearch"),
                ("search", query),
                ("limit", limit.as_str()),
                ("namespace", "0"),
                ("format", "json"),
            ])
            .await?;

        parse_opensearch(&payload)
    }

    async fn extract(&self, title: &str) -> Result<Option<PageExtract>, AppError> {
        let payload = self
            .get_json(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .await?;

        parse_extract(payload)
    }
}

/// Opensearch answers `[query, [titles], [descriptions], [urls]]`.
fn parse_opensearch(payload: &Value) -> Result<Vec<SearchHit>, AppError> {
    let parts = payload
        .as_array()
        .filter(|parts| parts.len() >= 4)
        .ok_or_else(|| AppError::upstream("unexpected opensearch response shape"))?;

    let column = |index: usize| -> Vec<&str> {
        parts[index]
            .as_array()
            .map(|items| items.iter().map(|item| item.as_str().unwrap_or("")).collect())
            .unwrap_or_default()
    };

    let titles = column(1);
    let descriptions = column(2);
    let urls = column(3);

    Ok(titles
        .iter()
        .enumerate()
        .filter(|(_, title)| !title.trim().is_empty())
        .map(|(index, title)| SearchHit {
            title: title.to_string(),
            description: descriptions
                .get(index)
                .map(|description| description.trim())
                .filter(|description| !description.is_empty())
                .map(str::to_string),
            url: urls
                .get(index)
                .filter(|url| !url.is_empty())
                .map(|url| url.to_string())
                .unwrap_or_else(|| crate::domain::text::wikipedia_article_url(title)),
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: Vec<ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    #[serde(default)]
    extract: Option<String>,
}

fn parse_extract(payload: Value) -> Result<Option<PageExtract>, AppError> {
    let response: ExtractResponse = serde_json::from_value(payload)
        .map_err(|err| AppError::upstream(format!("unexpected extracts response: {err}")))?;

    let page = response
        .query
        .and_then(|query| query.pages.into_iter().next())
        .filter(|page| !page.missing && !page.invalid);

    Ok(page.and_then(|page| {
        let extract = page.extract.unwrap_or_default();
        if extract.trim().is_empty() {
            None
        } else {
            Some(PageExtract {
                title: page.title,
                extract,
            })
        }
    }))
}
