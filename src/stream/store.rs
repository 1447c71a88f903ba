//! Stream Token Store
//!
//! Issues, resolves, and sweeps stream tokens. Reads do not consume a token;
//! it stays resolvable until it expires.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::token::{IssuedToken, StreamToken};
use crate::cache::current_timestamp_ms;

/// Why a stream id did not resolve.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("stream token not found")]
    NotFound,

    #[error("stream token expired")]
    Expired,
}

// == Stream Token Store ==
#[derive(Debug)]
pub struct StreamTokenStore {
    tokens: HashMap<Uuid, StreamToken>,
    /// Token lifetime in milliseconds
    ttl_ms: u64,
}

impl StreamTokenStore {
    /// Creates a store whose tokens live `ttl_secs` seconds.
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            tokens: HashMap::new(),
            ttl_ms: ttl_secs.saturating_mul(1000),
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_ms / 1000
    }

    // == Issue ==
    /// Wraps `real_url` in a fresh random id.
    pub fn issue(&mut self, real_url: String, session_token: String) -> IssuedToken {
        self.issue_at(real_url, session_token, current_timestamp_ms())
    }

    pub fn issue_at(&mut self, real_url: String, session_token: String, now: u64) -> IssuedToken {
        let token = StreamToken {
            id: Uuid::new_v4(),
            real_url,
            owner_session_token: session_token,
            issued_at: now,
            expires_at: now.saturating_add(self.ttl_ms),
        };
        let issued = IssuedToken {
            id: token.id,
            expires_at: token.expires_at,
        };

        debug!("Issued stream token {} (expires {})", token.id, token.expires_at);
        self.tokens.insert(token.id, token);
        issued
    }

    // == Resolve ==
    /// Returns the wrapped token if it is still within its window.
    ///
    /// A stale token is deleted on the spot, so later lookups see `NotFound`.
    pub fn resolve(&mut self, id: &Uuid) -> Result<StreamToken, TokenError> {
        self.resolve_at(id, current_timestamp_ms())
    }

    pub fn resolve_at(&mut self, id: &Uuid, now: u64) -> Result<StreamToken, TokenError> {
        let token = self.tokens.get(id).ok_or(TokenError::NotFound)?;

        if token.is_expired_at(now) {
            self.tokens.remove(id);
            return Err(TokenError::Expired);
        }

        Ok(token.clone())
    }

    // == Sweep ==
    /// Removes every expired token, returning how many were removed.
    pub fn sweep(&mut self) -> usize {
        self.sweep_at(current_timestamp_ms())
    }

    pub fn sweep_at(&mut self, now: u64) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|_, token| !token.is_expired_at(now));
        before - self.tokens.len()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
