// Trending repositories - composite scoring and ranking
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::models::{DateRange, LanguageCount, Repository, SearchFilters, SortKey, SortOrder};
use crate::Error;

/// Ranked output never exceeds this many entries
pub const TRENDING_LIMIT: usize = 50;

/// Languages reported in trending stats
pub const TOP_LANGUAGES: usize = 10;

const SECONDS_PER_DAY: i64 = 86_400;

/// Time window for trending repositories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingWindow {
    Today,
    #[default]
    Week,
    Month,
}

impl TrendingWindow {
    /// Candidate search for this window
    pub fn filters(&self) -> SearchFilters {
        let (date_range, min_stars, sort) = match self {
            TrendingWindow::Today => (DateRange::Day, 5, SortKey::Updated),
            TrendingWindow::Week => (DateRange::Week, 10, SortKey::Stars),
            TrendingWindow::Month => (DateRange::Month, 50, SortKey::Stars),
        };

        SearchFilters {
            date_range: Some(date_range),
            min_stars: Some(min_stars),
            sort,
            order: SortOrder::Desc,
            ..Default::default()
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingWindow::Today => "today",
            TrendingWindow::Week => "week",
            TrendingWindow::Month => "month",
        }
    }
}

impl FromStr for TrendingWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" | "day" => Ok(TrendingWindow::Today),
            "week" => Ok(TrendingWindow::Week),
            "month" => Ok(TrendingWindow::Month),
            other => Err(Error::InvalidInput(format!("unknown time range: {}", other))),
        }
    }
}

/// How the ranked list is ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrendingSort {
    #[default]
    TrendingScore,
    Stars,
    Recent,
}

impl TrendingSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingSort::TrendingScore => "trending-score",
            TrendingSort::Stars => "stars",
            TrendingSort::Recent => "recent",
        }
    }
}

impl FromStr for TrendingSort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trending-score" | "score" => Ok(TrendingSort::TrendingScore),
            "stars" => Ok(TrendingSort::Stars),
            "recent" => Ok(TrendingSort::Recent),
            other => Err(Error::InvalidInput(format!("unknown trending sort: {}", other))),
        }
    }
}

/// A repository with its score for one ranking pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRepository {
    #[serde(flatten)]
    pub repository: Repository,
    pub trending_score: i64,
}

/// Summary of one trending list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingStats {
    pub total_repositories: usize,
    pub time_range: TrendingWindow,
    pub average_stars: f64,
    pub top_languages: Vec<LanguageCount>,
}

/// Whole days between `then` and `now`, floored toward negative infinity
///
/// Timestamps ahead of `now` give negative days and are scored as-is.
fn days_since(then: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - then).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Composite trending score
///
/// Log-scaled stars and forks, a recency bonus that decays two points a day
/// over 50 days, and a youth bonus that decays linearly over the first year.
pub fn trending_score(repo: &Repository, now: DateTime<Utc>) -> i64 {
    let days_since_update = days_since(repo.updated_at, now);
    let days_since_creation = days_since(repo.created_at, now);

    let star_score = (f64::from(repo.stars) + 1.0).log10() * 20.0;
    let recency_bonus = (100 - days_since_update * 2).max(0) as f64;
    let age_bonus = if days_since_creation < 365 {
        50.0 - (days_since_creation as f64 / 365.0) * 50.0
    } else {
        0.0
    };
    let fork_score = (f64::from(repo.forks) + 1.0).log10() * 10.0;

    (star_score + recency_bonus + age_bonus + fork_score).round() as i64
}

/// Score, sort and cap `candidates`
///
/// Pure in `(candidates, now, sort)`. The sort is stable, so ties keep input
/// order.
pub fn rank(
    candidates: Vec<Repository>,
    now: DateTime<Utc>,
    sort: TrendingSort,
) -> Vec<ScoredRepository> {
    let mut scored: Vec<ScoredRepository> = candidates
        .into_iter()
        .map(|repository| ScoredRepository {
            trending_score: trending_score(&repository, now),
            repository,
        })
        .collect();

    match sort {
        TrendingSort::TrendingScore => {
            scored.sort_by(|a, b| b.trending_score.cmp(&a.trending_score))
        }
        TrendingSort::Stars => {
            scored.sort_by(|a, b| b.repository.stars.cmp(&a.repository.stars))
        }
        TrendingSort::Recent => {
            scored.sort_by(|a, b| b.repository.updated_at.cmp(&a.repository.updated_at))
        }
    }

    scored.truncate(TRENDING_LIMIT);
    scored
}

/// Stats over an already ranked list
pub fn stats(ranked: &[ScoredRepository], window: TrendingWindow) -> TrendingStats {
    let total_stars: u64 = ranked.iter().map(|r| u64::from(r.repository.stars)).sum();
    let average_stars = if ranked.is_empty() {
        0.0
    } else {
        total_stars as f64 / ranked.len() as f64
    };

    TrendingStats {
        total_repositories: ranked.len(),
        time_range: window,
        average_stars,
        top_languages: language_histogram(ranked.iter().map(|r| &r.repository), TOP_LANGUAGES),
    }
}

/// Count languages, most common first, ties by first appearance
pub fn language_histogram<'a>(
    repos: impl IntoIterator<Item = &'a Repository>,
    limit: usize,
) -> Vec<LanguageCount> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for language in repos.into_iter().filter_map(|r| r.language.as_ref()) {
        let count = counts.entry(language.clone()).or_insert_with(|| {
            order.push(language.clone());
            0
        });
        *count += 1;
    }

    let mut histogram: Vec<LanguageCount> = order
        .into_iter()
        .map(|language| LanguageCount {
            count: counts[&language],
            language,
        })
        .collect();
    histogram.sort_by(|a, b| b.count.cmp(&a.count));
    histogram.truncate(limit);
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{repo, repo_dated};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_score_components() {
        let now = now();
        // 999 stars, 99 forks, updated today, created 2 years ago
        let r = repo_dated(1, 999, 99, now - Duration::days(730), now);
        // 60 + 100 + 0 + 20
        assert_eq!(trending_score(&r, now), 180);

        // Brand new, nothing else: 0 + 100 + 50 + 0
        let fresh = repo_dated(2, 0, 0, now, now);
        assert_eq!(trending_score(&fresh, now), 150);

        // Updated 60 days ago: recency bonus bottoms out at 0
        let stale = repo_dated(3, 0, 0, now - Duration::days(800), now - Duration::days(60));
        assert_eq!(trending_score(&stale, now), 0);
    }

    #[test]
    fn test_partial_days_are_floored() {
        let now = now();
        // 1 day 23 hours ago counts as 1 day: recency 98
        let r = repo_dated(1, 0, 0, now - Duration::days(800), now - Duration::hours(47));
        assert_eq!(trending_score(&r, now), 98);
    }

    #[test]
    fn test_future_update_is_not_clamped() {
        let now = now();
        // Updated 3 days ahead of `now`: 100 - (-3 * 2) = 106
        let r = repo_dated(1, 0, 0, now - Duration::days(800), now + Duration::days(3));
        assert_eq!(trending_score(&r, now), 106);

        // Half a day ahead floors to -1
        let skewed = repo_dated(2, 0, 0, now - Duration::days(800), now + Duration::hours(12));
        assert_eq!(trending_score(&skewed, now), 102);
    }

    #[test]
    fn test_age_bonus_is_linear_in_first_year() {
        let now = now();
        let half_year = repo_dated(1, 0, 0, now - Duration::days(73), now - Duration::days(50));
        // 50 - (73/365)*50 = 40
        assert_eq!(trending_score(&half_year, now), 40);
    }

    #[test]
    fn test_recent_update_ranks_higher() {
        let now = now();
        let created = now - Duration::days(400);
        let old = repo_dated(1, 500, 40, created, now - Duration::days(60));
        let new = repo_dated(2, 500, 40, created, now);

        let ranked = rank(vec![old, new], now, TrendingSort::TrendingScore);
        assert_eq!(ranked[0].repository.id, 2);
        assert!(ranked[0].trending_score > ranked[1].trending_score);
    }

    #[test]
    fn test_output_is_capped() {
        let now = now();
        let small: Vec<Repository> = (0..3).map(|i| repo(i, 10)).collect();
        assert_eq!(rank(small, now, TrendingSort::TrendingScore).len(), 3);

        let large: Vec<Repository> = (0..5000).map(|i| repo(i, (i % 700) as u32)).collect();
        let ranked = rank(large, now, TrendingSort::Stars);
        assert_eq!(ranked.len(), TRENDING_LIMIT);
        assert_eq!(ranked[0].repository.stars, 699);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let now = now();
        let candidates: Vec<Repository> = (0..10).map(|i| repo(i, 42)).collect();

        for sort in [TrendingSort::TrendingScore, TrendingSort::Stars, TrendingSort::Recent] {
            let ids: Vec<u64> = rank(candidates.clone(), now, sort)
                .iter()
                .map(|r| r.repository.id)
                .collect();
            assert_eq!(ids, (0..10).collect::<Vec<u64>>());
        }
    }

    #[test]
    fn test_sort_modes() {
        let now = now();
        let a = repo_dated(1, 10, 0, now - Duration::days(900), now - Duration::days(1));
        let b = repo_dated(2, 5000, 0, now - Duration::days(900), now - Duration::days(40));
        let c = repo_dated(3, 100, 0, now - Duration::days(900), now);

        let ids = |sort| -> Vec<u64> {
            rank(vec![a.clone(), b.clone(), c.clone()], now, sort)
                .iter()
                .map(|r| r.repository.id)
                .collect()
        };

        assert_eq!(ids(TrendingSort::Stars), vec![2, 3, 1]);
        assert_eq!(ids(TrendingSort::Recent), vec![3, 1, 2]);
        // c: 40 + 100 = 140, a: 21 + 98 = 119, b: 74 + 20 = 94
        assert_eq!(ids(TrendingSort::TrendingScore), vec![3, 1, 2]);
    }

    #[test]
    fn test_ranking_leaves_repository_untouched() {
        let now = now();
        let original = repo(7, 123);
        let ranked = rank(vec![original.clone()], now, TrendingSort::TrendingScore);
        assert_eq!(ranked[0].repository, original);
    }

    #[test]
    fn test_window_filters() {
        let today = TrendingWindow::Today.filters();
        assert_eq!(today.date_range, Some(DateRange::Day));
        assert_eq!(today.min_stars, Some(5));
        assert_eq!(today.sort, SortKey::Updated);

        let month = TrendingWindow::Month.filters();
        assert_eq!(month.date_range, Some(DateRange::Month));
        assert_eq!(month.min_stars, Some(50));
        assert_eq!(month.sort, SortKey::Stars);

        assert_eq!(TrendingWindow::default(), TrendingWindow::Week);
        assert_eq!("trending-score".parse::<TrendingSort>().unwrap(), TrendingSort::TrendingScore);
    }

    #[test]
    fn test_stats() {
        let now = now();
        let mut rust_a = repo(1, 100);
        rust_a.language = Some("Rust".to_string());
        let mut go = repo(2, 300);
        go.language = Some("Go".to_string());
        let mut rust_b = repo(3, 200);
        rust_b.language = Some("Rust".to_string());
        let none = repo(4, 0);

        let ranked = rank(vec![rust_a, go, rust_b, none], now, TrendingSort::Stars);
        let stats = stats(&ranked, TrendingWindow::Week);

        assert_eq!(stats.total_repositories, 4);
        assert_eq!(stats.average_stars, 150.0);
        assert_eq!(stats.top_languages[0].language, "Rust");
        assert_eq!(stats.top_languages[0].count, 2);
        assert_eq!(stats.top_languages[1].language, "Go");

        let empty = super::stats(&[], TrendingWindow::Today);
        assert_eq!(empty.average_stars, 0.0);
        assert!(empty.top_languages.is_empty());
    }
}
