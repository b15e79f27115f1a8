use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Rate limit telemetry reported by the upstream on every response
///
/// Both fields are optional: a missing or garbled header just means "unknown".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateTelemetry {
    pub remaining: Option<u32>,
    pub reset: Option<DateTime<Utc>>,
}

impl RateTelemetry {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let remaining = header_str(headers, REMAINING_HEADER).and_then(|raw| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| debug!("Ignoring malformed {}: {:?}", REMAINING_HEADER, raw))
                .ok()
        });

        let reset = header_str(headers, RESET_HEADER).and_then(|raw| {
            raw.trim()
                .parse::<i64>()
                .ok()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .or_else(|| {
                    debug!("Ignoring malformed {}: {:?}", RESET_HEADER, raw);
                    None
                })
        });

        Self { remaining, reset }
    }

    /// True when the upstream told us the quota is used up
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
