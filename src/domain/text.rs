//! Text helpers shared by the tool formatters

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

const BLANK_RUNS_PATTERN: &str = r"\n[ \t]*(\n[ \t]*){2,}";
const ARTICLE_BASE_URL: &str = "https://en.wikipedia.org/wiki/";

/// Trims an optional argument and treats blank strings as absent.
pub fn normalize_argument(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Cuts `text` to at most `max_chars` characters, never splitting a char.
/// Returns the text and whether anything was dropped.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (text[..byte_index].trim_end(), true),
        None => (text, false),
    }
}

pub fn collapse_blank_lines(text: &str) -> String {
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();
    let pattern = BLANK_RUNS
        .get_or_init(|| Regex::new(BLANK_RUNS_PATTERN).expect("blank line pattern compiles"));

    pattern.replace_all(text.trim(), "\n\n").into_owned()
}

/// Article URL for a page title. The title becomes one percent-encoded path
/// segment, so `?`, `#`, `%` and `/` stay part of the title.
pub fn wikipedia_article_url(title: &str) -> String {
    let mut url = Url::parse(ARTICLE_BASE_URL).expect("article base url parses");
    url.path_segments_mut()
        .expect("https url has path segments")
        .pop_if_empty()
        .push(&title.trim().replace(' ', "_"));
    url.into()
}
