// Discovery service - the cache-first front door for every inbound operation
use awesomehub_cache::{CacheStore, MemoryStore, ReadThroughCache};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::categories::{CategoryAggregator, CategoryCounts, KNOWN_CATEGORIES};
use crate::classify::classify_lookup;
use crate::config::Config;
use crate::error::{ErrorPayload, UpstreamError};
use crate::gateway::{SearchGateway, SearchOutcome};
use crate::models::{
    Contributor, LanguageCount, Repository, SearchFilters, SearchResult, SortKey, SortOrder,
};
use crate::providers::GitHubProvider;
use crate::query::{build_query_at, topic_query};
use crate::search::SearchProvider;
use crate::trending::{self, ScoredRepository, TrendingSort, TrendingStats, TrendingWindow};
use crate::Result;

/// Related repositories come from a single topic page of this size
pub const RELATED_PAGE_SIZE: u32 = 30;

/// Languages reported by `popular_languages`
pub const POPULAR_LANGUAGES: usize = 20;

const POPULAR_LANGUAGES_MIN_STARS: u32 = 100;

/// Search envelope: the page plus credential and error reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub result: SearchResult,
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingResponse {
    pub repositories: Vec<ScoredRepository>,
    pub stats: TrendingStats,
    pub last_updated: DateTime<Utc>,
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

pub struct DiscoveryService {
    gateway: SearchGateway,
    aggregator: CategoryAggregator,
    cache: ReadThroughCache,
    config: Config,
}

impl DiscoveryService {
    /// Wire a service over `provider`; `store` is both the shared cache and the clock
    pub fn new(provider: Arc<dyn SearchProvider>, store: Arc<dyn CacheStore>, config: Config) -> Self {
        let gateway = SearchGateway::new(provider);
        Self {
            aggregator: CategoryAggregator::new(gateway.clone()),
            gateway,
            cache: ReadThroughCache::new(store),
            config,
        }
    }

    /// GitHub-backed service with a fresh in-memory cache
    pub fn from_config(config: Config) -> Result<Self> {
        let provider = GitHubProvider::from_config(&config.github)?;
        info!(
            "Using {} (authenticated: {})",
            config.github.api_url,
            provider.has_credential()
        );
        Ok(Self::new(
            Arc::new(provider),
            Arc::new(MemoryStore::new()),
            config,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.gateway.is_authenticated()
    }

    fn now(&self) -> DateTime<Utc> {
        self.cache.store().now()
    }

    fn payload(&self, error: &UpstreamError) -> ErrorPayload {
        error.payload(self.is_authenticated())
    }

    /// Simple mode: just the repositories on `page`
    pub async fn search(&self, filters: &SearchFilters, page: u32) -> Vec<Repository> {
        self.search_with_meta(filters, page, self.config.search.per_page)
            .await
            .result
            .items
    }

    /// Envelope mode: total count, has-more, rate telemetry and any classified error
    pub async fn search_with_meta(
        &self,
        filters: &SearchFilters,
        page: u32,
        per_page: u32,
    ) -> SearchResponse {
        let outcome = self.cached_search(filters, page, per_page).await;
        SearchResponse {
            error: outcome.error.as_ref().map(|e| self.payload(e)),
            result: outcome.result,
            authenticated: self.is_authenticated(),
        }
    }

    async fn cached_search(&self, filters: &SearchFilters, page: u32, per_page: u32) -> SearchOutcome {
        let query = build_query_at(filters, self.now());
        self.cached_query(&query, filters.sort, filters.order, page, per_page)
            .await
    }

    async fn cached_query(
        &self,
        query: &str,
        sort: SortKey,
        order: SortOrder,
        page: u32,
        per_page: u32,
    ) -> SearchOutcome {
        let key = format!(
            "search:{}|{}|{}|{}|{}",
            query,
            sort.as_str(),
            order.as_str(),
            page.max(1),
            per_page.max(1)
        );

        // Only real upstream answers are stored; failures and the
        // past-the-ceiling short circuit are recomputed every time
        let cached = self
            .cache
            .cache_first(&key, self.config.cache.search_ttl_minutes, || async {
                let outcome = self.gateway.search(query, sort, order, page, per_page).await;
                if outcome.is_ok() && !outcome.short_circuited {
                    Ok(outcome.result)
                } else {
                    Err(outcome)
                }
            })
            .await;

        match cached {
            Ok(result) => SearchOutcome {
                result,
                error: None,
                short_circuited: false,
            },
            Err(outcome) => outcome,
        }
    }

    /// Category view: merged topic searches, deduplicated, most stars first
    pub async fn category(&self, category: &str) -> Vec<Repository> {
        let key = format!("category:{}", category);
        let now = self.now();

        let cached = self
            .cache
            .cache_first(&key, self.config.cache.category_ttl_minutes, || async {
                let repos = self.aggregator.aggregate(category, now).await;
                // Every topic failing looks the same as an empty category;
                // don't pin that for a whole TTL
                if repos.is_empty() {
                    Err(repos)
                } else {
                    Ok(repos)
                }
            })
            .await;

        cached.unwrap_or_else(|empty| empty)
    }

    /// Counts for every known category, fanned out concurrently
    pub async fn category_counts(&self) -> CategoryCounts {
        let counts = join_all(KNOWN_CATEGORIES.iter().map(|category| async move {
            let repos = self.category(category).await;
            (category.to_string(), repos.len())
        }))
        .await;

        CategoryCounts {
            category_counts: counts.into_iter().collect(),
            total_categories: KNOWN_CATEGORIES.len(),
            last_updated: self.now(),
        }
    }

    /// Ranked trending list for `window`
    pub async fn trending(&self, window: TrendingWindow, sort: TrendingSort) -> TrendingResponse {
        let key = format!("trending:{}:{}", window.as_str(), sort.as_str());

        let cached = self
            .cache
            .cache_first(&key, self.config.cache.trending_ttl_minutes, || async {
                let now = self.now();
                let outcome = self
                    .cached_search(&window.filters(), 1, self.config.search.per_page)
                    .await;

                let repositories = trending::rank(outcome.result.items, now, sort);
                let response = TrendingResponse {
                    stats: trending::stats(&repositories, window),
                    repositories,
                    last_updated: now,
                    authenticated: self.is_authenticated(),
                    error: outcome.error.as_ref().map(|e| self.payload(e)),
                };

                if response.error.is_none() {
                    Ok(response)
                } else {
                    Err(response)
                }
            })
            .await;

        cached.unwrap_or_else(|degraded| degraded)
    }

    /// Single repository; `Ok(None)` when it doesn't exist
    pub async fn repository(&self, owner: &str, name: &str) -> Result<Option<Repository>> {
        let key = format!("repo:{}/{}", owner, name);

        let found = self
            .cache
            .cache_first(&key, self.config.cache.lookup_ttl_minutes, || async {
                self.gateway
                    .provider()
                    .get_repository(owner, name)
                    .await
                    .map_err(|failure| self.lookup_error(&failure, owner, name))
            })
            .await;

        not_found_as_none(found.map(Some))
    }

    /// Contributors page; empty when the repository doesn't exist
    pub async fn contributors(
        &self,
        owner: &str,
        name: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Contributor>> {
        let key = format!("contributors:{}/{}|{}|{}", owner, name, page, per_page);

        let found = self
            .cache
            .cache_first(&key, self.config.cache.lookup_ttl_minutes, || async {
                self.gateway
                    .provider()
                    .list_contributors(owner, name, page, per_page)
                    .await
                    .map_err(|failure| self.lookup_error(&failure, owner, name))
            })
            .await;

        not_found_as_none(found.map(Some)).map(Option::unwrap_or_default)
    }

    /// Decoded README text; `None` when missing or not decodable
    pub async fn readme(&self, owner: &str, name: &str) -> Result<Option<String>> {
        let key = format!("readme:{}/{}", owner, name);

        let found = self
            .cache
            .cache_first(&key, self.config.cache.lookup_ttl_minutes, || async {
                self.gateway
                    .provider()
                    .get_readme(owner, name)
                    .await
                    .map_err(|failure| self.lookup_error(&failure, owner, name))
            })
            .await;

        not_found_as_none(found)
    }

    /// Repositories sharing this one's first topic
    ///
    /// Anything going wrong, including a repository without topics,
    /// yields an empty list.
    pub async fn related(&self, owner: &str, name: &str) -> Vec<Repository> {
        let repo = match self.repository(owner, name).await {
            Ok(Some(repo)) => repo,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Related lookup for {}/{} failed: {}", owner, name, e);
                return Vec::new();
            }
        };

        let Some(topic) = repo.topics.first() else {
            debug!("{} has no topics, nothing related", repo.full_name);
            return Vec::new();
        };

        self.cached_query(
            &topic_query(topic),
            SortKey::Stars,
            SortOrder::Desc,
            1,
            RELATED_PAGE_SIZE,
        )
        .await
        .result
        .items
    }

    /// Most common languages among well-starred matches
    pub async fn popular_languages(&self) -> Vec<LanguageCount> {
        let filters = SearchFilters {
            min_stars: Some(POPULAR_LANGUAGES_MIN_STARS),
            ..Default::default()
        };
        let outcome = self
            .cached_search(&filters, 1, self.config.search.per_page)
            .await;

        trending::language_histogram(&outcome.result.items, POPULAR_LANGUAGES)
    }

    fn lookup_error(
        &self,
        failure: &crate::classify::UpstreamFailure,
        owner: &str,
        name: &str,
    ) -> UpstreamError {
        let error = classify_lookup(failure, self.is_authenticated(), &format!("{}/{}", owner, name));
        match &error {
            UpstreamError::NotFound(what) => debug!("{} not found", what),
            other => warn!("Lookup of {}/{} failed: {} ({})", owner, name, other, failure),
        }
        error
    }
}

fn not_found_as_none<T>(found: std::result::Result<Option<T>, UpstreamError>) -> Result<Option<T>> {
    match found {
        Ok(value) => Ok(value),
        Err(UpstreamError::NotFound(_)) => Ok(None),
        Err(other) => Err(other.into()),
    }
}
