//! Request and Response models for the proxy API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    HandshakeRequest, ImageQuery, RecommendationsQuery, SearchQuery, SessionTokenRequest,
    StreamIssueQuery,
};
pub use responses::{
    CacheStatsView, CleanupResponse, ClearCacheResponse, ErrorResponse, HandshakeResponse,
    HealthResponse, RefreshResponse, StatsResponse, StreamIssueResponse, StreamResolveResponse,
    ValidateResponse,
};
