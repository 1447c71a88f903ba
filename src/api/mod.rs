//! API Module
//!
//! HTTP handlers and routing for the proxy REST API.
//!
//! # Endpoints
//! - `GET /api/health`, `GET /api/stats` - Liveness and cache counters
//! - `GET /api/content/*` - Catalogue reads and the image transform
//! - `GET /api/stream/*` - Stream token issue, resolve and cleanup
//! - `POST /api/client/*` - Session handshake, validation and refresh

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
