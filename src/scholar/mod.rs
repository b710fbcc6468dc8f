pub mod article;
pub mod classify;
pub mod fetch;
pub mod identifier;
pub mod locale;
pub mod profile;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Selector};
use serde::Serialize;

use fetch::FetchError;

/// Host serving both the citation view and the author profile pages.
pub const SOURCE_HOST: &str = "scholar.google.com";
pub const CITATIONS_PATH: &str = "/citations";
/// Result language forced onto every fetched page; the extractors match English labels.
pub const FIXED_LOCALE: &str = "en";
pub const DEFAULT_PUB_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UrlKind {
    Article,
    Profile,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedUrl {
    pub raw: String,
    pub kind: UrlKind,
}

/// A single publication as shown on its citation view page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PublicationRecord {
    #[serde(rename = "publication_id")]
    pub canonical_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Set only when persistence updated an existing row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One row of an author's publication list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PublicationSummary {
    #[serde(rename = "publication_id", skip_serializing_if = "Option::is_none")]
    pub canonical_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(rename = "profile_img", skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub publications: Vec<PublicationSummary>,
}

pub(crate) fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Parse(format!("{:?}", e)))
}

/// Concatenated text content of an element.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

/// Trimmed text content, `None` when nothing but whitespace remains.
pub(crate) fn non_empty_text(el: ElementRef<'_>) -> Option<String> {
    let text = element_text(el);
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
