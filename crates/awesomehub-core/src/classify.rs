// Upstream failure classification
use awesomehub_api::{GitHubError, RateTelemetry};

use crate::error::UpstreamError;

/// Phrases GitHub uses when it throttles on 403
const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "secondary rate", "abuse", "quota"];

/// Raw failure as the provider saw it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamFailure {
    pub status: Option<u16>,
    pub message: String,
    pub rate: RateTelemetry,
}

impl UpstreamFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            rate: RateTelemetry::default(),
        }
    }

    pub fn with_rate(mut self, rate: RateTelemetry) -> Self {
        self.rate = rate;
        self
    }
}

impl From<&GitHubError> for UpstreamFailure {
    fn from(err: &GitHubError) -> Self {
        Self {
            status: err.status(),
            message: err.message(),
            rate: err.rate(),
        }
    }
}

impl std::fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{}: {}", status, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Map a failure from the search path onto the closed taxonomy
///
/// Never fails. 404 is not special here; only single-repository lookups
/// report `NotFound`, see [`classify_lookup`].
pub fn classify(failure: &UpstreamFailure, authenticated: bool) -> UpstreamError {
    match failure.status {
        Some(401) => UpstreamError::Unauthenticated,
        Some(429) => UpstreamError::RateLimited { authenticated },
        Some(403) if mentions_rate_limit(&failure.message) || failure.rate.is_exhausted() => {
            UpstreamError::RateLimited { authenticated }
        }
        _ => UpstreamError::Unknown(failure.to_string()),
    }
}

/// Same as [`classify`] but a 404 becomes `NotFound(what)`
pub fn classify_lookup(failure: &UpstreamFailure, authenticated: bool, what: &str) -> UpstreamError {
    match failure.status {
        Some(404) => UpstreamError::NotFound(what.to_string()),
        _ => classify(failure, authenticated),
    }
}

fn mentions_rate_limit(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    RATE_LIMIT_MARKERS.iter().any(|marker| message.contains(marker))
}
