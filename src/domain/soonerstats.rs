//! SoonerStats lookup tools
//!
//! Each tool fetches one fixed index page on soonerstats.com and answers with a
//! pointer to it. Only the page title is read from the HTML.

use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::{macros, schema::Tool};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::catalog::{parse_arguments, ToolCatalog};
use crate::domain::text::normalize_argument;
use crate::errors::AppError;
use crate::upstream::soonerstats::{StatsPage, StatsSource};

pub const SERVER_NAME: &str = "soonerstats-mcp-server";

pub const SUPPORTED_SPORTS: [&str; 3] = ["football", "basketball", "baseball"];
pub const FIRST_SEASON: u32 = 1895;
pub const LAST_SEASON: u32 = 2100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoonerStatsTool {
    PlayerSearch,
    SeasonLookup,
    RecordSearch,
}

impl SoonerStatsTool {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "soonerstats_player_search" => Some(Self::PlayerSearch),
            "soonerstats_season_lookup" => Some(Self::SeasonLookup),
            "soonerstats_record_search" => Some(Self::RecordSearch),
            _ => None,
        }
    }

    fn section(self) -> &'static str {
        match self {
            Self::PlayerSearch => "players",
            Self::SeasonLookup => "seasons",
            Self::RecordSearch => "records",
        }
    }
}

#[macros::mcp_tool(
    name = "soonerstats_player_search",
    description = "Find Oklahoma Sooners player statistics on SoonerStats.com"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct PlayerSearchTool {
    /// Player name, e.g. "Baker Mayfield"
    pub player_name: String,
    /// One of football, basketball, baseball (default football)
    pub sport: Option<String>,
}

#[macros::mcp_tool(
    name = "soonerstats_season_lookup",
    description = "Find Oklahoma Sooners season results on SoonerStats.com"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct SeasonLookupTool {
    /// Season year, e.g. 2000
    pub year: u32,
    /// One of football, basketball, baseball (default football)
    pub sport: Option<String>,
}

#[macros::mcp_tool(
    name = "soonerstats_record_search",
    description = "Find Oklahoma Sooners records on SoonerStats.com"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct RecordSearchTool {
    /// Record category, e.g. "rushing yards"
    pub record_type: String,
    /// One of football, basketball, baseball (default football)
    pub sport: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayerSearchParams {
    pub player_name: Option<String>,
    pub sport: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeasonLookupParams {
    pub year: Option<YearArgument>,
    pub sport: Option<String>,
}

/// Clients send the year as a number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum YearArgument {
    Number(i64),
    Text(String),
    Other(Value),
}

impl YearArgument {
    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }

    fn as_year(&self) -> Option<i64> {
        match self {
            Self::Number(year) => Some(*year),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Other(_) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordSearchParams {
    pub record_type: Option<String>,
    pub sport: Option<String>,
}

pub struct SoonerStatsCatalog {
    source: Arc<dyn StatsSource>,
}

impl SoonerStatsCatalog {
    pub fn new(source: Arc<dyn StatsSource>) -> Self {
        Self { source }
    }

    pub async fn player_search(&self, params: PlayerSearchParams) -> String {
        let Some(player_name) = normalize_argument(params.player_name) else {
            return "Please provide a player name to search SoonerStats.".to_string();
        };
        let sport = match normalize_sport(params.sport) {
            Ok(sport) => sport,
            Err(message) => return message,
        };

        let subject = format!("{sport} player \"{player_name}\"");
        self.lookup(SoonerStatsTool::PlayerSearch, sport, &subject)
            .await
    }

    pub async fn season_lookup(&self, params: SeasonLookupParams) -> String {
        let Some(argument) = params.year.filter(|year| !year.is_blank()) else {
            return "Please provide a season year to look up on SoonerStats.".to_string();
        };
        let Some(year) = argument.as_year() else {
            return "Please provide the season year as a number, e.g. 2000.".to_string();
        };
        if !(i64::from(FIRST_SEASON)..=i64::from(LAST_SEASON)).contains(&year) {
            return format!(
                "Season year {year} is out of range. Please provide a year between {FIRST_SEASON} and {LAST_SEASON}."
            );
        }
        let sport = match normalize_sport(params.sport) {
            Ok(sport) => sport,
            Err(message) => return message,
        };

        let subject = format!("the {year} {sport} season");
        self.lookup(SoonerStatsTool::SeasonLookup, sport, &subject)
            .await
    }

    pub async fn record_search(&self, params: RecordSearchParams) -> String {
        let Some(record_type) = normalize_argument(params.record_type) else {
            return "Please provide a record type to search SoonerStats.".to_string();
        };
        let sport = match normalize_sport(params.sport) {
            Ok(sport) => sport,
            Err(message) => return message,
        };

        let subject = format!("{sport} records for \"{record_type}\"");
        self.lookup(SoonerStatsTool::RecordSearch, sport, &subject)
            .await
    }

    async fn lookup(&self, tool: SoonerStatsTool, sport: &str, subject: &str) -> String {
        let path = format!("/{sport}/{}/", tool.section());

        match self.source.fetch_page(&path).await {
            Ok(page) => format_pointer(subject, &page),
            Err(err) => {
                warn!(error = %err, path = %path, "soonerstats lookup failed");
                format!(
                    "Could not retrieve SoonerStats data for {subject}. Please try again later or visit {}",
                    self.source.page_url(&path)
                )
            }
        }
    }
}

#[async_trait]
impl ToolCatalog for SoonerStatsCatalog {
    fn server_name(&self) -> &'static str {
        SERVER_NAME
    }

    fn tools(&self) -> Vec<Tool> {
        vec![
            PlayerSearchTool::tool(),
            SeasonLookupTool::tool(),
            RecordSearchTool::tool(),
        ]
    }

    fn has_tool(&self, name: &str) -> bool {
        SoonerStatsTool::from_name(name).is_some()
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<String, AppError> {
        let Some(tool) = SoonerStatsTool::from_name(name) else {
            return Err(AppError::tool_not_found(name));
        };

        let text = match tool {
            SoonerStatsTool::PlayerSearch => self.player_search(parse_arguments(arguments)?).await,
            SoonerStatsTool::SeasonLookup => self.season_lookup(parse_arguments(arguments)?).await,
            SoonerStatsTool::RecordSearch => self.record_search(parse_arguments(arguments)?).await,
        };
        Ok(text)
    }
}

/// Resolves the sport argument to one of `SUPPORTED_SPORTS`; the error is the
/// reply text for the caller.
pub fn normalize_sport(sport: Option<String>) -> Result<&'static str, String> {
    let Some(sport) = normalize_argument(sport) else {
        return Ok(SUPPORTED_SPORTS[0]);
    };

    let lowered = sport.to_ascii_lowercase();
    SUPPORTED_SPORTS
        .iter()
        .copied()
        .find(|candidate| *candidate == lowered)
        .ok_or_else(|| {
            format!(
                "Unsupported sport \"{sport}\". Choose one of: {}.",
                SUPPORTED_SPORTS.join(", ")
            )
        })
}

pub fn format_pointer(subject: &str, page: &StatsPage) -> String {
    let mut text = format!(
        "SoonerStats has detailed data for {subject}. Browse it at {}",
        page.url
    );
    if let Some(title) = page.title.as_deref() {
        text.push_str(&format!("\nPage: {title}"));
    }
    text
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct MockSource {
        fail: bool,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StatsSource for MockSource {
        fn page_url(&self, path: &str) -> String {
            format!("https://www.soonerstats.com{path}")
        }

        async fn fetch_page(&self, path: &str) -> Result<StatsPage, AppError> {
            self.requested
                .lock()
                .expect("requested lock")
                .push(path.to_string());
            if self.fail {
                return Err(AppError::upstream("timed out"));
            }
            Ok(StatsPage {
                url: self.page_url(path),
                title: Some("SoonerStats.com".to_string()),
            })
        }
    }

    fn requested(source: &MockSource) -> Vec<String> {
        source.requested.lock().expect("requested lock").clone()
    }

    fn arguments(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn player_search_points_at_player_index() {
        let source = Arc::new(MockSource::default());
        let catalog = SoonerStatsCatalog::new(source.clone());

        let text = catalog
            .call_tool(
                "soonerstats_player_search",
                arguments(json!({"player_name": "Baker Mayfield"})),
            )
            .await
            .expect("tool call succeeds");

        assert_eq!(requested(&source), vec!["/football/players/"]);
        assert!(text.contains("football player \"Baker Mayfield\""));
        assert!(text.contains("https://www.soonerstats.com/football/players/"));
        assert!(text.ends_with("Page: SoonerStats.com"));
    }

    #[tokio::test]
    async fn season_lookup_uses_requested_sport() {
        let source = Arc::new(MockSource::default());
        let catalog = SoonerStatsCatalog::new(source.clone());

        let text = catalog
            .call_tool(
                "soonerstats_season_lookup",
                arguments(json!({"year": 2000, "sport": " Basketball "})),
            )
            .await
            .expect("tool call succeeds");

        assert_eq!(requested(&source), vec!["/basketball/seasons/"]);
        assert!(text.contains("the 2000 basketball season"));
    }

    #[tokio::test]
    async fn season_year_accepts_numeric_string() {
        let source = Arc::new(MockSource::default());
        let catalog = SoonerStatsCatalog::new(source.clone());

        let text = catalog
            .call_tool(
                "soonerstats_season_lookup",
                arguments(json!({"year": " 2000 "})),
            )
            .await
            .expect("tool call succeeds");

        assert_eq!(requested(&source), vec!["/football/seasons/"]);
        assert!(text.contains("the 2000 football season"));
    }

    #[tokio::test]
    async fn season_year_that_is_not_a_number_is_explained_without_fetch() {
        let source = Arc::new(MockSource::default());
        let catalog = SoonerStatsCatalog::new(source.clone());

        for year in [json!("two thousand"), json!(2000.5), json!([2000])] {
            let text = catalog
                .call_tool("soonerstats_season_lookup", arguments(json!({"year": year})))
                .await
                .expect("tool call succeeds");
            assert_eq!(text, "Please provide the season year as a number, e.g. 2000.");
        }

        let negative = catalog
            .call_tool("soonerstats_season_lookup", arguments(json!({"year": "-5"})))
            .await
            .expect("tool call succeeds");
        assert!(negative.starts_with("Season year -5 is out of range."));
        assert!(requested(&source).is_empty());
    }

    #[tokio::test]
    async fn season_year_out_of_range_is_rejected_without_fetch() {
        let source = Arc::new(MockSource::default());
        let catalog = SoonerStatsCatalog::new(source.clone());

        let text = catalog
            .season_lookup(SeasonLookupParams {
                year: Some(YearArgument::Number(1800)),
                sport: None,
            })
            .await;

        assert!(text.starts_with("Season year 1800 is out of range."));
        assert!(requested(&source).is_empty());
    }

    #[tokio::test]
    async fn missing_arguments_prompt_without_fetch() {
        let source = Arc::new(MockSource::default());
        let catalog = SoonerStatsCatalog::new(source.clone());

        let player = catalog
            .call_tool("soonerstats_player_search", Map::new())
            .await
            .expect("tool call succeeds");
        let season = catalog
            .call_tool("soonerstats_season_lookup", Map::new())
            .await
            .expect("tool call succeeds");
        let record = catalog
            .call_tool("soonerstats_record_search", arguments(json!({"record_type": ""})))
            .await
            .expect("tool call succeeds");

        assert_eq!(player, "Please provide a player name to search SoonerStats.");
        assert_eq!(season, "Please provide a season year to look up on SoonerStats.");
        assert_eq!(record, "Please provide a record type to search SoonerStats.");
        assert!(requested(&source).is_empty());
    }

    #[tokio::test]
    async fn unsupported_sport_is_reported() {
        let source = Arc::new(MockSource::default());
        let catalog = SoonerStatsCatalog::new(source.clone());

        let text = catalog
            .call_tool(
                "soonerstats_record_search",
                arguments(json!({"record_type": "passing", "sport": "curling"})),
            )
            .await
            .expect("tool call succeeds");

        assert_eq!(
            text,
            "Unsupported sport \"curling\". Choose one of: football, basketball, baseball."
        );
        assert!(requested(&source).is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_is_reported_as_text() {
        let catalog = SoonerStatsCatalog::new(Arc::new(MockSource {
            fail: true,
            ..Default::default()
        }));

        let text = catalog
            .call_tool(
                "soonerstats_record_search",
                arguments(json!({"record_type": "rushing yards"})),
            )
            .await
            .expect("upstream failure is not a protocol error");

        assert!(text.starts_with("Could not retrieve SoonerStats data for football records"));
        assert!(text.ends_with("https://www.soonerstats.com/football/records/"));
    }

    #[tokio::test]
    async fn unknown_tool_makes_no_fetch() {
        let source = Arc::new(MockSource::default());
        let catalog = SoonerStatsCatalog::new(source.clone());

        let error = catalog
            .call_tool("wikipedia_search", Map::new())
            .await
            .expect_err("unknown tool must fail");

        assert!(matches!(error, AppError::ToolNotFound { .. }));
        assert!(requested(&source).is_empty());
    }

    #[test]
    fn pointer_without_title_omits_page_line() {
        let text = format_pointer(
            "the 1985 football season",
            &StatsPage {
                url: "https://www.soonerstats.com/football/seasons/".to_string(),
                title: None,
            },
        );
        assert!(!text.contains("Page:"));
    }
}
