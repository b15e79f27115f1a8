// Category views - fan out one topic search per topic, merge the survivors
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::gateway::SearchGateway;
use crate::models::{Repository, SearchFilters};
use crate::query::build_query;

/// Every topic search in a category view requires at least this many stars
pub const CATEGORY_MIN_STARS: u32 = 50;

/// Page size for each topic search
pub const CATEGORY_PAGE_SIZE: u32 = 50;

/// Static category -> topic table
const CATEGORY_TOPICS: &[(&str, &[&str])] = &[
    ("frontend", &["react", "vue", "angular", "svelte", "frontend"]),
    ("backend", &["nodejs", "express", "fastapi", "django", "backend"]),
    ("mobile", &["react-native", "flutter", "swift", "kotlin", "mobile"]),
    ("ai-ml", &["machine-learning", "tensorflow", "pytorch", "ai", "ml"]),
    ("devops", &["docker", "kubernetes", "devops", "ci-cd", "deployment"]),
    ("database", &["database", "sql", "mongodb", "redis", "postgresql"]),
];

/// Categories shown on the overview; the ones missing from the table
/// search for themselves as a single topic
pub const KNOWN_CATEGORIES: &[&str] = &[
    "frontend",
    "backend",
    "mobile",
    "ai-ml",
    "devops",
    "database",
    "security",
    "web3",
    "system-programming",
    "tools",
    "design",
    "games",
];

/// Topics for a category, falling back to the identifier itself
pub fn topics_for(category: &str) -> Vec<String> {
    CATEGORY_TOPICS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, topics)| topics.iter().map(|t| t.to_string()).collect())
        .unwrap_or_else(|| vec![category.to_string()])
}

/// Per-category repository counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub category_counts: BTreeMap<String, usize>,
    pub total_categories: usize,
    pub last_updated: DateTime<Utc>,
}

/// Builds category views from concurrent topic searches
#[derive(Clone)]
pub struct CategoryAggregator {
    gateway: SearchGateway,
}

impl CategoryAggregator {
    pub fn new(gateway: SearchGateway) -> Self {
        Self { gateway }
    }

    /// Deduplicated repositories for `category`, most stars first
    pub async fn aggregate(&self, category: &str, now: DateTime<Utc>) -> Vec<Repository> {
        let topics = topics_for(category);
        let merged = self.aggregate_topics(&topics, now).await;
        debug!(
            "Category {} merged {} repositories from {} topics",
            category,
            merged.len(),
            topics.len()
        );
        merged
    }

    /// Search every topic concurrently and merge the results
    ///
    /// Waits for every topic search. A failing topic contributes nothing
    /// and does not fail the view.
    pub async fn aggregate_topics(&self, topics: &[String], now: DateTime<Utc>) -> Vec<Repository> {
        let today = now.date_naive();

        let searches = topics.iter().map(|topic| async move {
            let filters = SearchFilters {
                topic: Some(topic.clone()),
                min_stars: Some(CATEGORY_MIN_STARS),
                ..Default::default()
            };
            let query = build_query(&filters, today);
            let outcome = self
                .gateway
                .search(&query, filters.sort, filters.order, 1, CATEGORY_PAGE_SIZE)
                .await;

            match outcome.error {
                Some(err) => {
                    warn!("Topic {} failed, dropping its results: {}", topic, err);
                    Vec::new()
                }
                None => outcome.result.items,
            }
        });

        merge_by_stars(join_all(searches).await)
    }
}

/// Flatten, keep the first occurrence of each id, then sort by stars descending
///
/// The sort is stable, so equal star counts keep their merge order.
pub fn merge_by_stars(batches: Vec<Vec<Repository>>) -> Vec<Repository> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Repository> = batches
        .into_iter()
        .flatten()
        .filter(|repo| seen.insert(repo.id))
        .collect();

    merged.sort_by(|a, b| b.stars.cmp(&a.stars));
    merged
}
