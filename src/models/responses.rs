//! Response DTOs for the proxy API
//!
//! Defines the structure of outgoing HTTP response bodies. Catalogue bodies
//! are cached as JSON values and built in the content service instead.

use serde::Serialize;
use uuid::Uuid;

use crate::cache::CacheStats;

/// Cache counters as reported by GET /api/stats
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsView {
    pub hits: u64,
    pub misses: u64,
    /// Misses on entries past their TTL
    pub stale_misses: u64,
    pub evictions: u64,
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsView {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            stale_misses: stats.stale_misses,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for GET /api/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub responses: CacheStatsView,
    pub hot_images: CacheStatsView,
    pub active_streams: usize,
    pub sessions: usize,
}

/// Response body for the health endpoint (GET /api/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for POST /api/client/handshake
#[derive(Debug, Clone, Serialize)]
pub struct HandshakeResponse {
    pub success: bool,
    pub session_token: Uuid,
    /// Seconds until the session expires
    pub expires_in: u64,
    pub server_time: u64,
}

/// Response body for POST /api/client/validate
///
/// Invalid tokens are reported in the body with status 200.
#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_trusted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidateResponse {
    pub fn valid(trusted: bool) -> Self {
        Self {
            valid: true,
            is_trusted: Some(trusted),
            error: None,
        }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            is_trusted: None,
            error: Some(error.into()),
        }
    }
}

/// Response body for POST /api/client/refresh
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub success: bool,
    pub expires_in: u64,
    pub expires_at: u64,
}

/// Response body for GET /api/stream/episode/:episodeId
///
/// Carries the token only; the media URL is revealed by resolving it.
#[derive(Debug, Clone, Serialize)]
pub struct StreamIssueResponse {
    pub success: bool,
    pub stream_id: Uuid,
    /// Path that resolves the token
    pub resolve_path: String,
    pub expires_at: u64,
    /// Token lifetime in seconds
    pub ttl: u64,
    pub quality_options: Vec<String>,
}

/// Response body for GET /api/stream/stream/:streamId
#[derive(Debug, Clone, Serialize)]
pub struct StreamResolveResponse {
    pub success: bool,
    pub url: String,
    pub expires_at: u64,
}

/// Response body for GET /api/stream/cleanup
#[derive(Debug, Clone, Serialize)]
pub struct CleanupResponse {
    pub success: bool,
    pub cleaned_streams: usize,
}

/// Response body for GET /api/content/clear-cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearCacheResponse {
    pub success: bool,
    pub message: String,
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_view_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            stale_misses: 4,
            evictions: 5,
            total_entries: 100,
        };
        let view = CacheStatsView::from(stats);
        assert!((view.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(view.evictions, 5);
        assert_eq!(view.stale_misses, 4);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_validate_response_omits_empty_fields() {
        let json = serde_json::to_value(ValidateResponse::valid(true)).unwrap();
        assert_eq!(json, serde_json::json!({"valid": true, "is_trusted": true}));

        let json = serde_json::to_value(ValidateResponse::invalid("session expired")).unwrap();
        assert_eq!(json, serde_json::json!({"valid": false, "error": "session expired"}));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
