// Core business logic lives here - the brain of the operation
pub mod categories;
pub mod classify;
pub mod config;
pub mod discovery;
pub mod error;
pub mod gateway;
pub mod models;
pub mod providers;
pub mod query;
pub mod search;
pub mod trending;

pub use categories::{CategoryAggregator, CategoryCounts, KNOWN_CATEGORIES};
pub use classify::UpstreamFailure;
pub use config::Config;
pub use discovery::{DiscoveryService, SearchResponse, TrendingResponse};
pub use error::{Error, ErrorPayload, UpstreamError};
pub use gateway::{SearchGateway, SearchOutcome, RESULT_CEILING};
pub use models::{
    Contributor, DateRange, LanguageCount, Owner, RawSearchFilters, Repository, SearchFilters,
    SearchResult, SortKey, SortOrder,
};
pub use search::{SearchProvider, SearchRequest, UpstreamPage};
pub use trending::{ScoredRepository, TrendingSort, TrendingStats, TrendingWindow};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::{Owner, Repository};
    use chrono::{DateTime, TimeZone, Utc};

    /// Repository with fixed dates, no language, no forks
    pub fn repo(id: u64, stars: u32) -> Repository {
        repo_dated(
            id,
            stars,
            0,
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    pub fn repo_dated(
        id: u64,
        stars: u32,
        forks: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Repository {
        Repository {
            id,
            name: format!("repo-{}", id),
            full_name: format!("owner/repo-{}", id),
            description: None,
            url: format!("https://github.com/owner/repo-{}", id),
            stars,
            forks,
            language: None,
            topics: Vec::new(),
            created_at,
            updated_at,
            owner: Owner {
                login: "owner".to_string(),
                avatar_url: "https://avatars.githubusercontent.com/u/1".to_string(),
                profile_url: "https://github.com/owner".to_string(),
            },
        }
    }
}
