// Upstream API client for the repository search platform
pub mod github;
pub mod rate;
pub mod retry;

// Re-export common types
pub use github::{
    GitHubClient, GitHubContributor, GitHubError, GitHubOwner, GitHubRepo, SearchPage,
    SearchParams, MAX_PER_PAGE,
};
pub use rate::RateTelemetry;
pub use retry::RetryConfig;
