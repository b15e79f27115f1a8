use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Remediation hint for anonymous callers
pub const TOKEN_SUGGESTION: &str = "Add GITHUB_TOKEN environment variable for higher rate limits";

/// All the ways things can go wrong in AwesomeHub
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Upstream client error: {0}")]
    ClientError(#[from] awesomehub_api::GitHubError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Closed taxonomy for upstream failures
///
/// `RateLimited` stays distinct from `Unknown` all the way out so callers can
/// answer with 429 and the token hint instead of a generic 500.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UpstreamError {
    #[error("GitHub API authentication failed. Check your GITHUB_TOKEN.")]
    Unauthenticated,

    #[error("GitHub API rate limit exceeded")]
    RateLimited { authenticated: bool },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream request failed: {0}")]
    Unknown(String),
}

impl UpstreamError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, UpstreamError::RateLimited { .. })
    }

    /// Status code a collaborator should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            UpstreamError::Unauthenticated => 401,
            UpstreamError::RateLimited { .. } => 429,
            UpstreamError::NotFound(_) => 404,
            UpstreamError::Unknown(_) => 500,
        }
    }

    /// Serializable form carrying the credential flag
    pub fn payload(&self, authenticated: bool) -> ErrorPayload {
        ErrorPayload {
            error: self.to_string(),
            status: self.status_code(),
            rate_limited: self.is_rate_limited(),
            authenticated,
            suggestion: (!authenticated).then(|| TOKEN_SUGGESTION.to_string()),
        }
    }
}

/// Error body handed to UI/API collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub status: u16,
    pub rate_limited: bool,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(UpstreamError::Unauthenticated.status_code(), 401);
        assert_eq!(
            UpstreamError::RateLimited {
                authenticated: false
            }
            .status_code(),
            429
        );
        assert_eq!(UpstreamError::NotFound("a/b".into()).status_code(), 404);
        assert_eq!(UpstreamError::Unknown("x".into()).status_code(), 500);
    }

    #[test]
    fn test_payload_suggests_token_only_when_anonymous() {
        let err = UpstreamError::RateLimited {
            authenticated: false,
        };
        let payload = err.payload(false);
        assert!(payload.rate_limited);
        assert!(!payload.authenticated);
        assert_eq!(payload.suggestion.as_deref(), Some(TOKEN_SUGGESTION));

        let payload = UpstreamError::Unknown("boom".into()).payload(true);
        assert!(!payload.rate_limited);
        assert!(payload.authenticated);
        assert!(payload.suggestion.is_none());

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("suggestion").is_none());
    }
}
