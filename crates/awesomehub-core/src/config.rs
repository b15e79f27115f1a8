use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the upstream credential
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Main configuration structure
///
/// Priority: CLI > Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    /// Load config from the default location, then apply env overrides
    pub fn load() -> crate::Result<Self> {
        let config = Self::load_from(&Self::config_path()?)?;
        Ok(config.with_env_token(std::env::var(TOKEN_ENV).ok()))
    }

    /// Load config from `path`; a missing file means defaults
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// A non-empty token from the environment wins over the file
    pub fn with_env_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.github.token = Some(token);
        }
        self
    }

    /// Get the config file path
    fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("awesomehub");

        Ok(config_dir.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Personal access token; optional, only raises rate limits
    pub token: Option<String>,

    /// API URL (for GitHub Enterprise)
    #[serde(default = "default_github_url")]
    pub api_url: String,

    /// Extra attempts for network errors and 5xx; 0 disables retrying
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

fn default_max_retries() -> u32 {
    2
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_github_url(),
            max_retries: default_max_retries(),
        }
    }
}

/// TTLs, all in minutes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_search_ttl")]
    pub search_ttl_minutes: i64,

    #[serde(default = "default_category_ttl")]
    pub category_ttl_minutes: i64,

    #[serde(default = "default_trending_ttl")]
    pub trending_ttl_minutes: i64,

    /// Single-repository lookups, contributors, readmes
    #[serde(default = "default_lookup_ttl")]
    pub lookup_ttl_minutes: i64,
}

fn default_search_ttl() -> i64 {
    5
}

fn default_category_ttl() -> i64 {
    5
}

fn default_trending_ttl() -> i64 {
    10
}

fn default_lookup_ttl() -> i64 {
    60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl_minutes: default_search_ttl(),
            category_ttl_minutes: default_category_ttl(),
            trending_ttl_minutes: default_trending_ttl(),
            lookup_ttl_minutes: default_lookup_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_per_page() -> u32 {
    50
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.search_ttl_minutes, 5);
        assert_eq!(config.cache.trending_ttl_minutes, 10);
        assert_eq!(config.cache.lookup_ttl_minutes, 60);
        assert_eq!(config.search.per_page, 50);
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.max_retries, 2);
        assert!(config.github.token.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = Config::from_toml(
            r#"
            [github]
            token = "ghp_file"

            max_retries = 0

            [cache]
            trending_ttl_minutes = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.github.token.as_deref(), Some("ghp_file"));
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.max_retries, 0);
        assert_eq!(config.cache.trending_ttl_minutes, 30);
        assert_eq!(config.cache.search_ttl_minutes, 5);
        assert_eq!(config.search.per_page, 50);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml("[cache\nsearch_ttl_minutes = ").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigError(_)));
    }

    #[test]
    fn test_env_token_overrides_file() {
        let config = Config::from_toml("[github]\ntoken = \"ghp_file\"").unwrap();

        let config = config.with_env_token(Some("ghp_env".to_string()));
        assert_eq!(config.github.token.as_deref(), Some("ghp_env"));

        // Empty env var leaves the file token alone
        let config = config.with_env_token(Some(String::new()));
        assert_eq!(config.github.token.as_deref(), Some("ghp_env"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::load_from(Path::new("/nonexistent/awesomehub/config.toml")).unwrap();
        assert_eq!(config.search.per_page, 50);
    }

    #[test]
    fn test_config_serialization() {
        let toml = toml::to_string(&Config::default()).unwrap();
        assert!(toml.contains("search_ttl_minutes"));
        assert!(toml.contains("api_url"));
    }
}
