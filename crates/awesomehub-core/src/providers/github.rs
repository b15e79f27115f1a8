// GitHub provider implementation - bridges API client with SearchProvider trait
use async_trait::async_trait;
use awesomehub_api::{GitHubClient, GitHubContributor, GitHubRepo, RetryConfig, SearchParams};

use crate::{
    classify::UpstreamFailure,
    config::GitHubConfig,
    models::{Contributor, Owner, Repository},
    search::{SearchProvider, SearchRequest, UpstreamPage},
    Result,
};

/// Wrapper around GitHubClient that implements SearchProvider
pub struct GitHubProvider {
    client: GitHubClient,
}

impl GitHubProvider {
    pub fn new(token: Option<String>, api_url: &str) -> Result<Self> {
        let client = GitHubClient::with_base_url(token, api_url.to_string())?;
        Ok(Self { client })
    }

    /// Provider for the configured endpoint, token and retry budget
    pub fn from_config(config: &GitHubConfig) -> Result<Self> {
        let provider = Self::new(config.token.clone(), &config.api_url)?;
        Ok(provider.with_retry_config(RetryConfig {
            max_retries: config.max_retries,
            ..RetryConfig::default()
        }))
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.client = self.client.with_retry_config(retry_config);
        self
    }
}

#[async_trait]
impl SearchProvider for GitHubProvider {
    async fn search(
        &self,
        request: &SearchRequest,
    ) -> std::result::Result<UpstreamPage, UpstreamFailure> {
        let page = self
            .client
            .search_repositories(SearchParams {
                query: &request.query,
                sort: request.sort.as_str(),
                order: request.order.as_str(),
                page: request.page,
                per_page: request.per_page,
            })
            .await
            .map_err(|e| UpstreamFailure::from(&e))?;

        Ok(UpstreamPage {
            items: page.items.into_iter().map(github_to_repo).collect(),
            total_count: page.total_count,
            rate: page.rate,
        })
    }

    async fn get_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> std::result::Result<Repository, UpstreamFailure> {
        self.client
            .get_repository(owner, name)
            .await
            .map(github_to_repo)
            .map_err(|e| UpstreamFailure::from(&e))
    }

    async fn list_contributors(
        &self,
        owner: &str,
        name: &str,
        page: u32,
        per_page: u32,
    ) -> std::result::Result<Vec<Contributor>, UpstreamFailure> {
        let contributors = self
            .client
            .list_contributors(owner, name, page, per_page)
            .await
            .map_err(|e| UpstreamFailure::from(&e))?;

        Ok(contributors.into_iter().map(github_to_contributor).collect())
    }

    async fn get_readme(
        &self,
        owner: &str,
        name: &str,
    ) -> std::result::Result<Option<String>, UpstreamFailure> {
        self.client
            .get_readme(owner, name)
            .await
            .map_err(|e| UpstreamFailure::from(&e))
    }

    fn has_credential(&self) -> bool {
        self.client.has_token()
    }
}

/// Convert GitHub API repo to our internal Repository model
fn github_to_repo(gh: GitHubRepo) -> Repository {
    Repository {
        id: gh.id,
        name: gh.name,
        full_name: gh.full_name,
        description: gh.description,
        url: gh.html_url,
        stars: gh.stargazers_count,
        forks: gh.forks_count,
        language: gh.language,
        topics: gh.topics,
        created_at: gh.created_at,
        updated_at: gh.updated_at,
        owner: Owner {
            login: gh.owner.login,
            avatar_url: gh.owner.avatar_url,
            profile_url: gh.owner.html_url,
        },
    }
}

fn github_to_contributor(gh: GitHubContributor) -> Contributor {
    Contributor {
        login: gh.login,
        avatar_url: gh.avatar_url,
        profile_url: gh.html_url,
        contributions: gh.contributions,
    }
}
