//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default third-party content API.
pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://melolo-api-azure.vercel.app/api/melolo";

// == Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Entry bound for the response cache and the hot image cache
    pub max_entries: usize,
    /// TTL in seconds for cached responses and hot images
    pub cache_ttl: u64,
    /// Base URL of the upstream content API
    pub upstream_base_url: String,
    /// Upstream request timeout in seconds
    pub upstream_timeout: u64,
    /// Directory of the durable image cache
    pub image_cache_dir: PathBuf,
    /// External transcoder executable
    pub transcoder_bin: String,
    /// Transcoder timeout in seconds
    pub transcode_timeout: u64,
    /// Stream token lifetime in seconds
    pub stream_token_ttl: u64,
    /// Stream token sweep interval in seconds
    pub sweep_interval: u64,
    /// Session lifetime in seconds, also the refresh extension
    pub session_ttl: u64,
    /// Allowed CORS origins, empty means any
    pub cors_origins: Vec<String>,
}

impl Config {
    // == From Environment ==
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8124)
    /// - `MAX_ENTRIES` - Cache entry bound (default: 100)
    /// - `CACHE_TTL` - Cache TTL in seconds (default: 300)
    /// - `UPSTREAM_BASE_URL` - Content API base URL
    /// - `UPSTREAM_TIMEOUT` - Upstream timeout in seconds (default: 15)
    /// - `IMAGE_CACHE_DIR` - Durable image cache directory (default: data/image_cache)
    /// - `TRANSCODER_BIN` - Transcoder executable (default: vips)
    /// - `TRANSCODE_TIMEOUT` - Transcoder timeout in seconds (default: 30)
    /// - `STREAM_TOKEN_TTL` - Stream token lifetime in seconds (default: 45)
    /// - `SWEEP_INTERVAL` - Stream token sweep interval in seconds (default: 60)
    /// - `SESSION_TTL` - Session lifetime in seconds (default: 600)
    /// - `CORS_ORIGINS` - Comma separated allowed origins (default: any)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            cache_ttl: parse_var("CACHE_TTL").unwrap_or(defaults.cache_ttl),
            upstream_base_url: env::var("UPSTREAM_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.upstream_base_url),
            upstream_timeout: parse_var("UPSTREAM_TIMEOUT").unwrap_or(defaults.upstream_timeout),
            image_cache_dir: env::var("IMAGE_CACHE_DIR")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.image_cache_dir),
            transcoder_bin: env::var("TRANSCODER_BIN")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.transcoder_bin),
            transcode_timeout: parse_var("TRANSCODE_TIMEOUT")
                .unwrap_or(defaults.transcode_timeout),
            stream_token_ttl: parse_var("STREAM_TOKEN_TTL").unwrap_or(defaults.stream_token_ttl),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            session_ttl: parse_var("SESSION_TTL").unwrap_or(defaults.session_ttl),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

// == Defaults ==
impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8124,
            max_entries: 100,
            cache_ttl: 300,
            upstream_base_url: DEFAULT_UPSTREAM_BASE_URL.to_string(),
            upstream_timeout: 15,
            image_cache_dir: PathBuf::from("data/image_cache"),
            transcoder_bin: "vips".to_string(),
            transcode_timeout: 30,
            stream_token_ttl: 45,
            sweep_interval: 60,
            session_ttl: 600,
            cors_origins: Vec::new(),
        }
    }
}
