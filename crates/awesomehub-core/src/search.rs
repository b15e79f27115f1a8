use awesomehub_api::RateTelemetry;

use crate::classify::UpstreamFailure;
use crate::models::{Contributor, Repository, SortKey, SortOrder};

/// One paginated search call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub sort: SortKey,
    pub order: SortOrder,
    /// 1-indexed
    pub page: u32,
    pub per_page: u32,
}

/// What the upstream answered for one search call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamPage {
    pub items: Vec<Repository>,
    pub total_count: u64,
    pub rate: RateTelemetry,
}

/// Trait for the upstream platform - makes testing easier and keeps the
/// gateway honest about what it needs
///
/// Failures come back as raw [`UpstreamFailure`]s; classification happens
/// one layer up.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<UpstreamPage, UpstreamFailure>;

    async fn get_repository(&self, owner: &str, name: &str) -> Result<Repository, UpstreamFailure>;

    async fn list_contributors(
        &self,
        owner: &str,
        name: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Contributor>, UpstreamFailure>;

    async fn get_readme(&self, owner: &str, name: &str) -> Result<Option<String>, UpstreamFailure>;

    /// Whether a credential is configured; absence is valid, just slower
    fn has_credential(&self) -> bool;
}
