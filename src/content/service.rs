//! Content Service
//!
//! Write-through TTL cache in front of the upstream catalogue. Cached values
//! are the finished JSON bodies, keyed by logical query.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;

use super::models::{ContentDetail, ContentItem};
use crate::cache::{current_timestamp_ms, CacheStats, ResponseCache};
use crate::error::{ProxyError, Result};
use crate::upstream::UpstreamClient;

// == Limits ==
/// Shortest accepted search query, after trimming.
pub const MIN_QUERY_LEN: usize = 2;

/// Recommendations returned at most.
const MAX_RECOMMENDATIONS: usize = 10;

// == Content Service ==
#[derive(Debug, Clone)]
pub struct ContentService {
    cache: Arc<RwLock<ResponseCache<Value>>>,
    upstream: UpstreamClient,
}

impl ContentService {
    // == Constructor ==
    pub fn new(upstream: UpstreamClient, max_entries: usize, ttl_secs: u64) -> Self {
        Self {
            cache: Arc::new(RwLock::new(ResponseCache::new(max_entries, ttl_secs))),
            upstream,
        }
    }

    // == Lists ==
    pub async fn latest(&self) -> Result<Value> {
        self.cached_list("latest").await
    }

    pub async fn trending(&self) -> Result<Value> {
        self.cached_list("trending").await
    }

    // == Search ==
    /// Searches the catalogue. The query is validated before any cache or
    /// upstream access.
    pub async fn search(&self, query: &str, limit: u32, offset: u32) -> Result<Value> {
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_LEN {
            return Err(ProxyError::InvalidRequest(format!(
                "Query must be at least {MIN_QUERY_LEN} characters"
            )));
        }

        let key = format!("search_{query}_{limit}_{offset}");
        if let Some(hit) = self.cached(&key).await {
            return Ok(hit);
        }

        let response = self
            .upstream
            .fetch_json(
                "search",
                &[
                    ("query", trimmed.to_string()),
                    ("limit", limit.to_string()),
                    ("offset", offset.to_string()),
                ],
            )
            .await?;

        let books = response
            .pointer("/data/search_data/0/books")
            .or_else(|| response.get("books"));
        let has_more = response
            .pointer("/data/has_more")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let result = json!({
            "success": true,
            "data": normalize_list(books),
            "query": query,
            "has_more": has_more,
            "cached_at": current_timestamp_ms(),
        });

        self.store(key, result.clone()).await;
        Ok(result)
    }

    // == Detail ==
    pub async fn detail(&self, id: &str) -> Result<Value> {
        let key = format!("detail_{id}");
        if let Some(hit) = self.cached(&key).await {
            return Ok(hit);
        }

        let response = self.upstream.fetch_json(&format!("detail/{id}"), &[]).await?;
        let data = response.get("data").unwrap_or(&response);

        let result = json!({
            "success": true,
            "data": ContentDetail::from_upstream(id, data),
            "cached_at": current_timestamp_ms(),
        });

        self.store(key, result.clone()).await;
        Ok(result)
    }

    // == Recommendations ==
    /// Latest and trending merged, minus watched ids. Not cached.
    pub async fn recommendations(&self, watched: &[String]) -> Result<Value> {
        let (latest, trending) = tokio::try_join!(
            self.upstream.fetch_json("latest", &[]),
            self.upstream.fetch_json("trending", &[]),
        )?;

        let data: Vec<ContentItem> = [&latest, &trending]
            .into_iter()
            .filter_map(|r| r.get("books").and_then(Value::as_array))
            .flatten()
            .filter(|item| !watched.contains(&ContentItem::raw_id(item)))
            .take(MAX_RECOMMENDATIONS)
            .map(ContentItem::from_upstream)
            .collect();

        Ok(json!({
            "success": true,
            "data": data,
            "based_on_history": !watched.is_empty(),
            "cached_at": current_timestamp_ms(),
        }))
    }

    // == Maintenance ==
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    // == Cache Access ==
    async fn cached_list(&self, endpoint: &str) -> Result<Value> {
        if let Some(hit) = self.cached(endpoint).await {
            return Ok(hit);
        }

        let response = self.upstream.fetch_json(endpoint, &[]).await?;
        let result = json!({
            "success": true,
            "data": normalize_list(response.get("books")),
            "cached_at": current_timestamp_ms(),
        });

        self.store(endpoint.to_string(), result.clone()).await;
        Ok(result)
    }

    async fn cached(&self, key: &str) -> Option<Value> {
        let hit = self.cache.write().await.get(key);
        debug!("Response cache {}: {}", if hit.is_some() { "hit" } else { "miss" }, key);
        hit
    }

    async fn store(&self, key: String, value: Value) {
        self.cache.write().await.set(key, value);
    }
}

// == Normalization ==
fn normalize_list(books: Option<&Value>) -> Vec<ContentItem> {
    books
        .and_then(Value::as_array)
        .map(|list| list.iter().map(ContentItem::from_upstream).collect())
        .unwrap_or_default()
}
