//! Content Module
//!
//! Normalized catalogue responses served through the TTL response cache.

mod models;
mod service;

pub use models::{parse_categories, Category, ContentDetail, ContentItem, Episode};
pub use service::{ContentService, MIN_QUERY_LEN};
