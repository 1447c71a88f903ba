//! Image Service
//!
//! `get_or_transcode` resolves `(source_url, width)` to transcoded bytes:
//! 1. hot in-memory mirror (TTL bound)
//! 2. durable file `<cache_dir>/<md5(url)>_<width>.webp`
//! 3. fetch source, write a temp file, run the transcoder into the durable
//!    path, remove the temp file
//!
//! Concurrent callers for one key share a single run of steps 2-3.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::key::{cache_key, negotiate_source};
use super::{ImageError, ImageFetcher, Transcoder};
use crate::cache::{CacheStats, ResponseCache};

// == Image Service ==
type SharedLoad = Shared<BoxFuture<'static, Result<Bytes, ImageError>>>;

/// Content-addressed image transform cache.
#[derive(Clone)]
pub struct ImageService {
    cache_dir: PathBuf,
    hot: Arc<RwLock<ResponseCache<Bytes>>>,
    fetcher: Arc<dyn ImageFetcher>,
    transcoder: Arc<dyn Transcoder>,
    // Single-flight table keyed by cache key
    in_flight: Arc<Mutex<HashMap<String, SharedLoad>>>,
}

impl fmt::Debug for ImageService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_flight = self
            .in_flight
            .try_lock()
            .map(|guard| guard.len())
            .unwrap_or(0);

        f.debug_struct("ImageService")
            .field("cache_dir", &self.cache_dir)
            .field("in_flight", &in_flight)
            .finish()
    }
}

impl ImageService {
    // == Constructor ==
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        max_entries: usize,
        ttl_secs: u64,
        fetcher: Arc<dyn ImageFetcher>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            hot: Arc::new(RwLock::new(ResponseCache::new(max_entries, ttl_secs))),
            fetcher,
            transcoder,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // == Cache Directory ==
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Durable path for `(source_url, width)`.
    pub fn cached_path(&self, source_url: &str, width: u32) -> PathBuf {
        self.cache_dir.join(cache_key(source_url, width))
    }

    /// Creates the cache directory if needed.
    pub async fn ensure_cache_dir(&self) -> Result<(), ImageError> {
        fs::create_dir_all(&self.cache_dir).await?;
        Ok(())
    }

    // == Stats ==
    /// Statistics of the hot mirror.
    pub async fn hot_stats(&self) -> CacheStats {
        self.hot.read().await.stats()
    }

    // == Get Or Transcode ==
    /// Returns transcoded bytes for `(source_url, width)`.
    ///
    /// The pipeline run is spawned, so it finishes and fills the cache even
    /// when every caller stops waiting.
    pub async fn get_or_transcode(&self, source_url: &str, width: u32) -> Result<Bytes, ImageError> {
        let key = cache_key(source_url, width);

        if let Some(bytes) = self.hot.write().await.get(&key) {
            debug!("Hot image hit: {}", key);
            return Ok(bytes);
        }

        let flight = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(&key) {
                Some(flight) => {
                    debug!("Joining in-flight image load: {}", key);
                    flight.clone()
                }
                None => {
                    let flight = self.start_load(key.clone(), source_url.to_string(), width);
                    in_flight.insert(key, flight.clone());
                    tokio::spawn(flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    // == Pipeline ==
    fn start_load(&self, key: String, source_url: String, width: u32) -> SharedLoad {
        let this = self.clone();
        async move {
            let result = this.load(&key, &source_url, width).await;
            this.in_flight.lock().await.remove(&key);
            result
        }
        .boxed()
        .shared()
    }

    async fn load(&self, key: &str, source_url: &str, width: u32) -> Result<Bytes, ImageError> {
        let path = self.cache_dir.join(key);

        if let Some(bytes) = read_non_empty(&path).await? {
            debug!("Durable image hit: {}", key);
            self.remember(key, bytes.clone()).await;
            return Ok(bytes);
        }

        self.ensure_cache_dir().await?;

        let (fetch_url, format) = negotiate_source(source_url);
        let data = self.fetcher.fetch(&fetch_url).await?;

        let temp = self.cache_dir.join(format!(
            "temp_{}.{}",
            Uuid::new_v4().simple(),
            format.temp_extension()
        ));
        let outcome = self.transcode_from(&temp, &data, &path, width).await;

        if let Err(e) = fs::remove_file(&temp).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove temp file {}: {}", temp.display(), e);
            }
        }

        if let Err(e) = outcome {
            // Never leave a partial file where the durable lookup would find it
            let _ = fs::remove_file(&path).await;
            return Err(e);
        }

        let bytes = read_non_empty(&path).await?.ok_or_else(|| {
            ImageError::Transcode(format!("no output written to {}", path.display()))
        })?;

        info!(
            "Transcoded {} ({} -> {} bytes) into {}",
            fetch_url,
            data.len(),
            bytes.len(),
            key
        );
        self.remember(key, bytes.clone()).await;
        Ok(bytes)
    }

    async fn transcode_from(
        &self,
        temp: &Path,
        data: &[u8],
        output: &Path,
        width: u32,
    ) -> Result<(), ImageError> {
        fs::write(temp, data).await?;
        self.transcoder.transcode(temp, output, width).await
    }

    async fn remember(&self, key: &str, bytes: Bytes) {
        self.hot.write().await.set(key.to_string(), bytes);
    }
}

// == Durable Reads ==
async fn read_non_empty(path: &Path) -> Result<Option<Bytes>, ImageError> {
    match fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(Some(Bytes::from(fs::read(path).await?))),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
