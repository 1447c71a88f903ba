//! Media Proxy - caching gateway in front of a short-video content API
//!
//! Caches catalogue responses, transcodes cover images to WebP, and hands out
//! short-lived stream tokens to validated client sessions.

pub mod api;
pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod image;
pub mod models;
pub mod session;
pub mod stream;
pub mod tasks;
pub mod upstream;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{ProxyError, Result};
pub use tasks::spawn_sweep_task;
