//! Error types for the proxy server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::image::ImageError;
use crate::models::ErrorResponse;
use crate::session::SessionError;
use crate::stream::TokenError;
use crate::upstream::UpstreamError;

// == Proxy Error Enum ==
/// Unified error type for the proxy server.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Missing or malformed request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing, unknown, or expired session on a protected operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Client device rejected by the classifier
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unknown token or resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// Token past its lifetime
    #[error("Expired: {0}")]
    Expired(String),

    /// Upstream API or media host failure
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Image pipeline failure
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for ProxyError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::NotFound => ProxyError::NotFound("Stream not found or expired".to_string()),
            TokenError::Expired => ProxyError::Expired("Stream expired".to_string()),
        }
    }
}

impl From<SessionError> for ProxyError {
    fn from(err: SessionError) -> Self {
        ProxyError::Unauthorized(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ProxyError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ProxyError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ProxyError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ProxyError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ProxyError::Expired(msg) => (StatusCode::GONE, msg.clone()),
            // Upstream details stay in the log, clients get a generic message
            ProxyError::Upstream(_) | ProxyError::Image(_) | ProxyError::Internal(_) => {
                error!("{}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the proxy server.
pub type Result<T> = std::result::Result<T, ProxyError>;
