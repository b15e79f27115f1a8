// Query expression builder - filters in, search string out
use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::{DateRange, SearchFilters};

pub const DEFAULT_QUERY: &str = "awesome";

/// Build the upstream query expression for `filters`
///
/// Clause order is fixed (text, language, topic, stars, forks, date) so the
/// output doubles as a cache key. `today` anchors the date-range cutoff.
pub fn build_query(filters: &SearchFilters, today: NaiveDate) -> String {
    let mut parts = vec![text_clause(filters.query.as_deref())];

    parts.extend(language_clause(filters.language.as_deref()));
    parts.extend(topic_clause(filters.topic.as_deref()));
    parts.extend(min_clause("stars", filters.min_stars));
    parts.extend(min_clause("forks", filters.min_forks));
    parts.extend(filters.date_range.map(|range| date_clause(range, today)));

    parts.join(" ")
}

/// [`build_query`] anchored at `now`
pub fn build_query_at(filters: &SearchFilters, now: DateTime<Utc>) -> String {
    build_query(filters, now.date_naive())
}

/// Topic-scoped "awesome" search used for related repositories
pub fn topic_query(topic: &str) -> String {
    format!("topic:{} {}", topic.trim(), text_clause(None))
}

fn text_clause(query: Option<&str>) -> String {
    let query = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(DEFAULT_QUERY);
    format!("{0} in:name OR {0} in:description", query)
}

fn language_clause(language: Option<&str>) -> Option<String> {
    non_empty(language).map(|l| format!("language:{}", l))
}

fn topic_clause(topic: Option<&str>) -> Option<String> {
    non_empty(topic).map(|t| format!("topic:{}", t))
}

fn min_clause(field: &str, min: Option<u32>) -> Option<String> {
    min.filter(|n| *n > 0).map(|n| format!("{}:>={}", field, n))
}

fn date_clause(range: DateRange, today: NaiveDate) -> String {
    let cutoff = today - Duration::days(range.days());
    format!("pushed:>{}", cutoff.format("%Y-%m-%d"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
