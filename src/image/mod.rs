//! Image Module
//!
//! Content-addressed cache of transcoded images. Lookups go through an
//! in-memory hot mirror, then the durable cache directory, and finally the
//! fetch + transcode pipeline.

mod key;
mod service;
mod transcoder;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::upstream::UpstreamError;

pub use key::{cache_key, negotiate_source, SourceFormat, TARGET_EXTENSION};
pub use service::ImageService;
pub use transcoder::{Transcoder, VipsTranscoder};

/// Content type of every image the pipeline produces.
pub const TARGET_CONTENT_TYPE: &str = "image/webp";

// == Image Error ==
/// Failure of the image pipeline.
///
/// Cloneable so one in-flight result can be handed to every waiting caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// Source bytes could not be fetched
    #[error("failed to fetch image: {0}")]
    Fetch(UpstreamError),

    /// Transcoder exited non-zero, crashed, timed out, or produced nothing
    #[error("transcode failed: {0}")]
    Transcode(String),

    /// Cache directory or temp file I/O
    #[error("image cache I/O: {0}")]
    Io(String),
}

impl ImageError {
    /// Whether the media host refused us.
    ///
    /// Any non-2xx answer from the host counts: signed media URLs that have
    /// lapsed come back as 403 or 404 depending on the CDN.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ImageError::Fetch(UpstreamError::Status(_)))
    }
}

impl From<UpstreamError> for ImageError {
    fn from(err: UpstreamError) -> Self {
        ImageError::Fetch(err)
    }
}

impl From<std::io::Error> for ImageError {
    fn from(err: std::io::Error) -> Self {
        ImageError::Io(err.to_string())
    }
}

// == Image Fetcher ==
/// Source of raw image bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_classification() {
        assert!(ImageError::Fetch(UpstreamError::Status(403)).is_access_denied());
        assert!(ImageError::Fetch(UpstreamError::Status(404)).is_access_denied());
        assert!(!ImageError::Fetch(UpstreamError::Request("reset".into())).is_access_denied());
        assert!(!ImageError::Transcode("bad header".into()).is_access_denied());
        assert!(!ImageError::Io("disk full".into()).is_access_denied());
    }
}
