use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;

use crate::errors::AppError;

const TITLE_PATTERN: &str = r"(?is)<title[^>]*>(.*?)</title>";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsPage {
    pub url: String,
    pub title: Option<String>,
}

#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Absolute URL the given site path resolves to.
    fn page_url(&self, path: &str) -> String;

    async fn fetch_page(&self, path: &str) -> Result<StatsPage, AppError>;
}

#[derive(Debug, Clone)]
pub struct HttpSoonerStatsClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSoonerStatsClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StatsSource for HttpSoonerStatsClient {
    fn page_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn fetch_page(&self, path: &str) -> Result<StatsPage, AppError> {
        let url = self.page_url(path);
        let html = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(StatsPage {
            title: extract_html_title(&html),
            url,
        })
    }
}

pub fn extract_html_title(html: &str) -> Option<String> {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();

    let title_pattern =
        TITLE.get_or_init(|| Regex::new(TITLE_PATTERN).expect("title pattern compiles"));
    let raw = title_pattern.captures(html)?.get(1)?.as_str();

    let decoded = decode_entities(raw);
    let collapsed = WHITESPACE
        .get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern compiles"))
        .replace_all(decoded.trim(), " ")
        .into_owned();

    Some(collapsed).filter(|title| !title.is_empty())
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&#039;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
