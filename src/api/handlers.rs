//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::content::ContentService;
use crate::error::{ProxyError, Result};
use crate::image::{ImageService, Transcoder, VipsTranscoder, TARGET_CONTENT_TYPE};
use crate::models::{
    CleanupResponse, ClearCacheResponse, HandshakeRequest, HandshakeResponse, HealthResponse,
    ImageQuery, RecommendationsQuery, RefreshResponse, SearchQuery, SessionTokenRequest,
    StatsResponse, StreamIssueQuery, StreamIssueResponse, StreamResolveResponse, ValidateResponse,
};
use crate::session::{
    DeviceClassifier, DeviceInfo, NewSession, SessionError, SessionStore, UserAgentClassifier,
};
use crate::stream::StreamTokenStore;
use crate::upstream::{UpstreamClient, UpstreamError};

/// Image responses are cacheable by clients for five minutes.
const IMAGE_CACHE_CONTROL: &str = "public, max-age=300";

/// Application state shared across all handlers.
///
/// Every service is constructed once at start-up and shared by handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub content: ContentService,
    pub images: ImageService,
    pub streams: Arc<RwLock<StreamTokenStore>>,
    pub sessions: Arc<RwLock<SessionStore>>,
    pub upstream: UpstreamClient,
    pub classifier: Arc<dyn DeviceClassifier>,
}

impl AppState {
    /// Creates the production state: reqwest upstream and the vips transcoder.
    pub fn from_config(config: &Config) -> std::result::Result<Self, UpstreamError> {
        let upstream = UpstreamClient::new(
            config.upstream_base_url.clone(),
            std::time::Duration::from_secs(config.upstream_timeout),
        )?;
        let transcoder = Arc::new(VipsTranscoder::new(
            config.transcoder_bin.clone(),
            std::time::Duration::from_secs(config.transcode_timeout),
        ));
        Ok(Self::new(config, upstream, transcoder))
    }

    /// Creates state around an explicit upstream client and transcoder.
    pub fn new(config: &Config, upstream: UpstreamClient, transcoder: Arc<dyn Transcoder>) -> Self {
        let images = ImageService::new(
            config.image_cache_dir.clone(),
            config.max_entries,
            config.cache_ttl,
            Arc::new(upstream.clone()),
            transcoder,
        );

        Self {
            config: Arc::new(config.clone()),
            content: ContentService::new(upstream.clone(), config.max_entries, config.cache_ttl),
            images,
            streams: Arc::new(RwLock::new(StreamTokenStore::new(config.stream_token_ttl))),
            sessions: Arc::new(RwLock::new(SessionStore::new(config.session_ttl))),
            upstream,
            classifier: Arc::new(UserAgentClassifier),
        }
    }
}

// == Operational ==

/// Handler for GET /api/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /api/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        responses: state.content.stats().await.into(),
        hot_images: state.images.hot_stats().await.into(),
        active_streams: state.streams.read().await.len(),
        sessions: state.sessions.read().await.len(),
    })
}

// == Content ==

/// Handler for GET /api/content/image
///
/// Serves the transcoded image. When the media host refuses the source the
/// client is redirected to the original URL instead.
pub async fn image_handler(
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<Response> {
    let source_url = query.source_url().map_err(ProxyError::InvalidRequest)?;
    let width = query.width();

    match state.images.get_or_transcode(&source_url, width).await {
        Ok(bytes) => Ok((
            [
                (header::CONTENT_TYPE, TARGET_CONTENT_TYPE.to_string()),
                (header::CACHE_CONTROL, IMAGE_CACHE_CONTROL.to_string()),
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
            ],
            bytes,
        )
            .into_response()),
        Err(e) if e.is_access_denied() => {
            warn!("Image source refused ({}), redirecting to {}", e, source_url);
            Ok((StatusCode::FOUND, [(header::LOCATION, source_url)]).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handler for GET /api/content/latest
pub async fn latest_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    Ok(Json(state.content.latest().await?))
}

/// Handler for GET /api/content/trending
pub async fn trending_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    Ok(Json(state.content.trending().await?))
}

/// Handler for GET /api/content/search
pub async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>> {
    let text = query.query.as_deref().unwrap_or_default();
    Ok(Json(
        state
            .content
            .search(text, query.limit(), query.offset())
            .await?,
    ))
}

/// Handler for GET /api/content/detail/:id
pub async fn detail_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    if id.trim().is_empty() {
        return Err(ProxyError::InvalidRequest("Content id is required".to_string()));
    }
    Ok(Json(state.content.detail(id.trim()).await?))
}

/// Handler for GET /api/content/recommendations
pub async fn recommendations_handler(
    State(state): State<AppState>,
    Query(query): Query<RecommendationsQuery>,
) -> Result<Json<Value>> {
    Ok(Json(
        state
            .content
            .recommendations(&query.watched_ids())
            .await?,
    ))
}

/// Handler for GET /api/content/clear-cache
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    state.content.clear_cache().await;
    info!("Response cache cleared");
    Json(ClearCacheResponse {
        success: true,
        message: "Cache cleared".to_string(),
    })
}

// == Streams ==

/// Handler for GET /api/stream/episode/:episodeId
///
/// Requires a valid session and a trusted device. Issues a stream token for
/// the upstream media URL.
pub async fn stream_issue_handler(
    State(state): State<AppState>,
    Path(episode_id): Path<String>,
    Query(query): Query<StreamIssueQuery>,
    headers: HeaderMap,
) -> Result<Json<StreamIssueResponse>> {
    let token = query
        .session_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ProxyError::Unauthorized("Session required".to_string()))?;
    let session = state.sessions.read().await.validate(token)?;

    let device = device_info(&headers);
    let verdict = state.classifier.classify(&device);
    if verdict.suspicious {
        warn!(
            "Stream request from {} rejected: {:?}",
            device.ip, verdict.reasons
        );
        return Err(ProxyError::Forbidden("Device not allowed".to_string()));
    }

    let stream = state
        .upstream
        .fetch_json(&format!("stream/{episode_id}"), &[])
        .await?;
    let real_url = stream
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| UpstreamError::Decode("stream response has no url".to_string()))?
        .to_string();
    let quality_options = stream
        .get("quality_options")
        .and_then(Value::as_array)
        .map(|opts| {
            opts.iter()
                .filter_map(|o| o.as_str().map(String::from))
                .collect::<Vec<_>>()
        })
        .filter(|opts| !opts.is_empty())
        .unwrap_or_else(|| vec!["auto".to_string()]);

    let (issued, ttl) = {
        let mut streams = state.streams.write().await;
        (
            streams.issue(real_url, session.token.to_string()),
            streams.ttl_secs(),
        )
    };
    info!(
        "Stream {} issued for episode {} (device {:?})",
        issued.id,
        episode_id,
        device.device_id()
    );

    Ok(Json(StreamIssueResponse {
        success: true,
        stream_id: issued.id,
        resolve_path: format!("/api/stream/stream/{}", issued.id),
        expires_at: issued.expires_at,
        ttl,
        quality_options,
    }))
}

/// Handler for GET /api/stream/stream/:streamId
pub async fn stream_resolve_handler(
    State(state): State<AppState>,
    Path(stream_id): Path<String>,
) -> Result<Json<StreamResolveResponse>> {
    // A malformed id cannot have been issued
    let id = Uuid::parse_str(&stream_id)
        .map_err(|_| ProxyError::NotFound("Stream not found or expired".to_string()))?;
    let token = state.streams.write().await.resolve(&id)?;

    Ok(Json(StreamResolveResponse {
        success: true,
        url: token.real_url,
        expires_at: token.expires_at,
    }))
}

/// Handler for GET /api/stream/cleanup
pub async fn stream_cleanup_handler(State(state): State<AppState>) -> Json<CleanupResponse> {
    let cleaned_streams = state.streams.write().await.sweep();
    Json(CleanupResponse {
        success: true,
        cleaned_streams,
    })
}

// == Client sessions ==

/// Handler for POST /api/client/handshake
pub async fn handshake_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<HandshakeRequest>,
) -> Result<Json<HandshakeResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ProxyError::InvalidRequest(error_msg));
    }

    let device = device_info(&headers);
    let verdict = state.classifier.classify(&device);

    let session = {
        let mut sessions = state.sessions.write().await;
        sessions.create(NewSession {
            device_fingerprint: req.device_fingerprint.unwrap_or_default(),
            app_version: req.app_version,
            ip: device.ip,
            trusted: !verdict.suspicious,
        })
    };

    Ok(Json(HandshakeResponse {
        success: true,
        session_token: session.token,
        expires_in: (session.expires_at - session.created_at) / 1000,
        server_time: session.created_at,
    }))
}

/// Handler for POST /api/client/validate
pub async fn validate_handler(
    State(state): State<AppState>,
    Json(req): Json<SessionTokenRequest>,
) -> Result<Json<ValidateResponse>> {
    let token = req
        .token()
        .ok_or_else(|| ProxyError::InvalidRequest("session_token is required".to_string()))?;

    let response = match state.sessions.read().await.validate(token) {
        Ok(session) => ValidateResponse::valid(session.trusted),
        Err(e) => ValidateResponse::invalid(e.to_string()),
    };
    Ok(Json(response))
}

/// Handler for POST /api/client/refresh
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(req): Json<SessionTokenRequest>,
) -> Result<Json<RefreshResponse>> {
    let token = req
        .token()
        .ok_or_else(|| ProxyError::InvalidRequest("session_token is required".to_string()))?;

    let mut sessions = state.sessions.write().await;
    let session = sessions.refresh(token).map_err(|e| match e {
        SessionError::Invalid => ProxyError::NotFound("Session not found".to_string()),
        SessionError::Expired => ProxyError::from(e),
    })?;

    Ok(Json(RefreshResponse {
        success: true,
        expires_in: sessions.ttl_secs(),
        expires_at: session.expires_at,
    }))
}

/// Collects classifier input from request headers.
fn device_info(headers: &HeaderMap) -> DeviceInfo {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let ip = header_str("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .or_else(|| header_str("x-real-ip"))
        .unwrap_or("unknown")
        .to_string();

    DeviceInfo {
        ip,
        user_agent: header_str("user-agent").unwrap_or_default().to_string(),
        fingerprint: header_str("x-device-fingerprint")
            .or_else(|| header_str("x-fingerprint"))
            .map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use tempfile::TempDir;

    struct NoopTranscoder;

    #[async_trait::async_trait]
    impl Transcoder for NoopTranscoder {
        async fn transcode(
            &self,
            _input: &std::path::Path,
            _output: &std::path::Path,
            _width: u32,
        ) -> std::result::Result<(), crate::image::ImageError> {
            Ok(())
        }
    }

    fn test_state(dir: &TempDir) -> AppState {
        let config = Config {
            image_cache_dir: dir.path().to_path_buf(),
            // Nothing listens here; these tests never reach upstream
            upstream_base_url: "http://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let upstream =
            UpstreamClient::new(&config.upstream_base_url, std::time::Duration::from_secs(1))
                .unwrap();
        AppState::new(&config, upstream, Arc::new(NoopTranscoder))
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_handshake_then_validate_and_refresh() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let mut headers = HeaderMap::new();
        headers.insert(
            "user-agent",
            HeaderValue::from_static("Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0"),
        );
        let req = HandshakeRequest {
            device_fingerprint: Some("fingerprint-1234567890".to_string()),
            timestamp: Some(1),
            app_version: None,
        };
        let session = handshake_handler(State(state.clone()), headers, Json(req))
            .await
            .unwrap();
        assert_eq!(session.expires_in, 600);

        let token = SessionTokenRequest {
            session_token: Some(session.session_token.to_string()),
        };
        let validated = validate_handler(State(state.clone()), Json(token.clone()))
            .await
            .unwrap();
        assert!(validated.valid);
        assert_eq!(validated.is_trusted, Some(true));

        let refreshed = refresh_handler(State(state), Json(token)).await.unwrap();
        assert!(refreshed.success);
        assert_eq!(refreshed.expires_in, 600);
    }

    #[tokio::test]
    async fn test_handshake_marks_scripted_client_untrusted() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let mut headers = HeaderMap::new();
        headers.insert("user-agent", HeaderValue::from_static("curl/8.4.0"));
        let req = HandshakeRequest {
            device_fingerprint: Some("fp".to_string()),
            timestamp: Some(1),
            app_version: None,
        };
        let session = handshake_handler(State(state.clone()), headers, Json(req))
            .await
            .unwrap();

        let stored = state
            .sessions
            .read()
            .await
            .validate(&session.session_token.to_string())
            .unwrap();
        assert!(!stored.trusted);
    }

    #[tokio::test]
    async fn test_handshake_missing_fields() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let result =
            handshake_handler(State(state), HeaderMap::new(), Json(HandshakeRequest::default()))
                .await;
        assert!(matches!(result, Err(ProxyError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_validate_unknown_token_is_reported_in_body() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let req = SessionTokenRequest {
            session_token: Some(Uuid::new_v4().to_string()),
        };
        let response = validate_handler(State(state), Json(req)).await.unwrap();

        assert!(!response.valid);
        assert_eq!(response.error.as_deref(), Some("invalid session"));
    }

    #[tokio::test]
    async fn test_refresh_unknown_token_is_not_found() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let req = SessionTokenRequest {
            session_token: Some(Uuid::new_v4().to_string()),
        };
        let result = refresh_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(ProxyError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stream_issue_requires_session_before_upstream() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let missing = stream_issue_handler(
            State(state.clone()),
            Path("ep1".to_string()),
            Query(StreamIssueQuery::default()),
            HeaderMap::new(),
        )
        .await;
        assert!(matches!(missing, Err(ProxyError::Unauthorized(_))));

        let unknown = stream_issue_handler(
            State(state.clone()),
            Path("ep1".to_string()),
            Query(StreamIssueQuery {
                session_token: Some(Uuid::new_v4().to_string()),
            }),
            HeaderMap::new(),
        )
        .await;
        assert!(matches!(unknown, Err(ProxyError::Unauthorized(_))));
        assert!(state.streams.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_stream_resolve_and_cleanup() {
        let dir = TempDir::new().unwrap();
        let state = test_state(&dir);

        let issued = state
            .streams
            .write()
            .await
            .issue("https://cdn/x.mp4".to_string(), "abc".to_string());

        let resolved = stream_resolve_handler(State(state.clone()), Path(issued.id.to_string()))
            .await
            .unwrap();
        assert_eq!(resolved.url, "https://cdn/x.mp4");

        let malformed = stream_resolve_handler(State(state.clone()), Path("nope".to_string())).await;
        assert!(matches!(malformed, Err(ProxyError::NotFound(_))));

        let cleanup = stream_cleanup_handler(State(state)).await;
        assert_eq!(cleanup.cleaned_streams, 0);
    }

    #[test]
    fn test_device_info_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("user-agent", HeaderValue::from_static("Mozilla/5.0"));
        headers.insert("x-fingerprint", HeaderValue::from_static("fp-9"));

        let device = device_info(&headers);

        assert_eq!(device.ip, "203.0.113.7");
        assert_eq!(device.user_agent, "Mozilla/5.0");
        assert_eq!(device.fingerprint.as_deref(), Some("fp-9"));
        assert_eq!(device_info(&HeaderMap::new()).ip, "unknown");
    }
}
