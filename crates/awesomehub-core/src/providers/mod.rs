// Provider implementations for the upstream platform
pub mod github;

pub use github::GitHubProvider;
