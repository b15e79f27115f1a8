use awesomehub_api::RateTelemetry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// Repository model - built per request, never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    /// Stable upstream identity, used for dedup
    pub id: u64,
    pub name: String,
    /// `owner/name`
    pub full_name: String,
    pub description: Option<String>,
    pub url: String,
    pub stars: u32,
    pub forks: u32,
    pub language: Option<String>,
    pub topics: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner: Owner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
    pub avatar_url: String,
    pub profile_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    pub avatar_url: String,
    pub profile_url: String,
    pub contributions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCount {
    pub language: String,
    pub count: usize,
}

/// Sort key understood by the search endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Stars,
    Forks,
    Updated,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Stars => "stars",
            SortKey::Forks => "forks",
            SortKey::Updated => "updated",
        }
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stars" => Ok(SortKey::Stars),
            "forks" => Ok(SortKey::Forks),
            "updated" => Ok(SortKey::Updated),
            other => Err(Error::InvalidInput(format!("unknown sort key: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidInput(format!("unknown sort order: {}", other))),
        }
    }
}

/// Relative "updated after" window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Day,
    Week,
    Month,
    Year,
}

impl DateRange {
    /// Calendar days subtracted from today to get the cutoff
    pub fn days(&self) -> i64 {
        match self {
            DateRange::Day => 1,
            DateRange::Week => 7,
            DateRange::Month => 30,
            DateRange::Year => 365,
        }
    }
}

impl FromStr for DateRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(DateRange::Day),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            "year" => Ok(DateRange::Year),
            other => Err(Error::InvalidInput(format!("unknown date range: {}", other))),
        }
    }
}

/// Typed search filters; every optional field maps to at most one query clause
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Free text, "awesome" when empty
    pub query: Option<String>,
    pub language: Option<String>,
    pub topic: Option<String>,
    /// Inclusive; zero counts as absent
    pub min_stars: Option<u32>,
    pub min_forks: Option<u32>,
    pub sort: SortKey,
    pub order: SortOrder,
    pub date_range: Option<DateRange>,
}

/// Filters as they arrive from a query string or the command line
///
/// Nothing here is rejected: malformed numbers and unknown enum values
/// fall back to absent or the default.
#[derive(Debug, Clone, Default)]
pub struct RawSearchFilters {
    pub query: Option<String>,
    pub language: Option<String>,
    pub topic: Option<String>,
    pub min_stars: Option<String>,
    pub min_forks: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub date_range: Option<String>,
}

impl From<RawSearchFilters> for SearchFilters {
    fn from(raw: RawSearchFilters) -> Self {
        Self {
            query: non_blank(raw.query),
            language: non_blank(raw.language),
            topic: non_blank(raw.topic),
            min_stars: raw.min_stars.as_deref().and_then(parse_count),
            min_forks: raw.min_forks.as_deref().and_then(parse_count),
            sort: raw
                .sort
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            order: raw
                .order
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            date_range: raw.date_range.and_then(|s| s.parse().ok()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Lenient count parsing: anything that isn't a positive integer is absent
pub fn parse_count(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// In upstream sort order
    pub items: Vec<Repository>,
    /// Upstream total, clamped to the result ceiling
    pub total_count: u64,
    pub page: u32,
    pub has_more: bool,
    pub rate: RateTelemetry,
}

impl SearchResult {
    pub fn empty(page: u32) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page,
            has_more: false,
            rate: RateTelemetry::default(),
        }
    }
}
