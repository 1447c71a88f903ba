//! Stream Token Module
//!
//! A short-lived opaque id standing in for a real media URL.

use serde::Serialize;
use uuid::Uuid;

// == Stream Token ==
/// Record behind an issued stream id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamToken {
    /// Opaque id handed to the client
    pub id: Uuid,
    /// The media URL the id stands for
    pub real_url: String,
    /// Session that requested the stream
    pub owner_session_token: String,
    /// Issue timestamp (Unix milliseconds)
    pub issued_at: u64,
    /// Expiry timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl StreamToken {
    /// A token is usable up to and including `expires_at`.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.expires_at
    }
}

/// What the issuer gets back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IssuedToken {
    pub id: Uuid,
    pub expires_at: u64,
}
