//! Request DTOs for the proxy API
//!
//! Query strings and JSON bodies accepted by the handlers. Fields are optional
//! so that missing parameters reach `validate` and produce our own 400 body.

use serde::Deserialize;

/// Width used when the client sends none or garbage.
pub const DEFAULT_IMAGE_WIDTH: u32 = 400;

/// Largest width we will transcode to.
pub const MAX_IMAGE_WIDTH: u32 = 2000;

pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Query for GET /api/content/image
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageQuery {
    pub url: Option<String>,
    pub width: Option<String>,
}

impl ImageQuery {
    /// Returns the absolute http(s) source URL in normalized form, or an
    /// error message. Tabs and newlines are dropped by the parser, so the
    /// result is always a valid header value.
    pub fn source_url(&self) -> Result<String, String> {
        let url = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| "URL is required".to_string())?;

        match reqwest::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(parsed.to_string()),
            _ => Err("URL must be an absolute http(s) URL".to_string()),
        }
    }

    /// Requested width: default when absent, unparseable, or zero; clamped to the maximum.
    pub fn width(&self) -> u32 {
        self.width
            .as_deref()
            .and_then(|w| w.trim().parse::<u32>().ok())
            .filter(|w| *w > 0)
            .map(|w| w.min(MAX_IMAGE_WIDTH))
            .unwrap_or(DEFAULT_IMAGE_WIDTH)
    }
}

/// Query for GET /api/content/search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl SearchQuery {
    pub fn limit(&self) -> u32 {
        parse_or(self.limit.as_deref(), DEFAULT_SEARCH_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        parse_or(self.offset.as_deref(), 0)
    }
}

/// Query for GET /api/content/recommendations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationsQuery {
    /// JSON array of watched content ids
    pub history: Option<String>,
}

impl RecommendationsQuery {
    /// Watched ids; a malformed list counts as no history.
    pub fn watched_ids(&self) -> Vec<String> {
        self.history
            .as_deref()
            .and_then(|h| serde_json::from_str::<Vec<serde_json::Value>>(h).ok())
            .map(|ids| {
                ids.into_iter()
                    .filter_map(|id| match id {
                        serde_json::Value::String(s) => Some(s),
                        serde_json::Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Query for GET /api/stream/episode/:episodeId
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamIssueQuery {
    pub session_token: Option<String>,
}

/// Body of POST /api/client/handshake
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandshakeRequest {
    pub device_fingerprint: Option<String>,
    pub timestamp: Option<u64>,
    pub app_version: Option<String>,
}

impl HandshakeRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match (&self.device_fingerprint, self.timestamp) {
            (Some(fp), Some(_)) if !fp.trim().is_empty() => None,
            _ => Some("device_fingerprint and timestamp are required".to_string()),
        }
    }
}

/// Body of POST /api/client/validate and /api/client/refresh
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionTokenRequest {
    pub session_token: Option<String>,
}

impl SessionTokenRequest {
    pub fn token(&self) -> Option<&str> {
        self.session_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

fn parse_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
