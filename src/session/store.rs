//! Session Store
//!
//! Holds client sessions keyed by opaque token. Expiry is checked lazily on
//! lookup; expired sessions are not deleted.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::cache::current_timestamp_ms;

/// Characters of the device fingerprint kept on the session.
const FINGERPRINT_PREFIX_LEN: usize = 16;

/// Why a session token was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid session")]
    Invalid,

    #[error("session expired")]
    Expired,
}

// == Session ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub token: Uuid,
    /// Leading characters of the client fingerprint, masked
    pub device_fingerprint_prefix: String,
    pub app_version: Option<String>,
    pub ip: String,
    pub trusted: bool,
    pub created_at: u64,
    pub expires_at: u64,
}

impl Session {
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.expires_at
    }
}

/// Client attributes recorded on a new session.
#[derive(Debug, Clone, Default)]
pub struct NewSession {
    pub device_fingerprint: String,
    pub app_version: Option<String>,
    pub ip: String,
    pub trusted: bool,
}

// == Session Store ==
#[derive(Debug)]
pub struct SessionStore {
    sessions: HashMap<Uuid, Session>,
    /// Session lifetime and refresh extension in milliseconds
    ttl_ms: u64,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl_ms: ttl_secs.saturating_mul(1000),
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_ms / 1000
    }

    // == Create ==
    pub fn create(&mut self, new: NewSession) -> Session {
        self.create_at(new, current_timestamp_ms())
    }

    pub fn create_at(&mut self, new: NewSession, now: u64) -> Session {
        let session = Session {
            token: Uuid::new_v4(),
            device_fingerprint_prefix: mask_fingerprint(&new.device_fingerprint),
            app_version: new.app_version,
            ip: new.ip,
            trusted: new.trusted,
            created_at: now,
            expires_at: now.saturating_add(self.ttl_ms),
        };

        info!(
            "Session created for {} (trusted: {})",
            session.ip, session.trusted
        );
        self.sessions.insert(session.token, session.clone());
        session
    }

    // == Validate ==
    /// Looks up `token`. Malformed tokens are simply unknown.
    pub fn validate(&self, token: &str) -> Result<Session, SessionError> {
        self.validate_at(token, current_timestamp_ms())
    }

    pub fn validate_at(&self, token: &str, now: u64) -> Result<Session, SessionError> {
        let id = Uuid::parse_str(token.trim()).map_err(|_| SessionError::Invalid)?;
        let session = self.sessions.get(&id).ok_or(SessionError::Invalid)?;

        if session.is_expired_at(now) {
            return Err(SessionError::Expired);
        }
        Ok(session.clone())
    }

    // == Refresh ==
    /// Extends a valid session to `now + ttl`.
    pub fn refresh(&mut self, token: &str) -> Result<Session, SessionError> {
        self.refresh_at(token, current_timestamp_ms())
    }

    pub fn refresh_at(&mut self, token: &str, now: u64) -> Result<Session, SessionError> {
        let session = self.validate_at(token, now)?;
        let expires_at = now.saturating_add(self.ttl_ms);

        let stored = self
            .sessions
            .get_mut(&session.token)
            .ok_or(SessionError::Invalid)?;
        stored.expires_at = expires_at;
        Ok(stored.clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn mask_fingerprint(fingerprint: &str) -> String {
    let prefix: String = fingerprint.chars().take(FINGERPRINT_PREFIX_LEN).collect();
    format!("{prefix}***")
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn new_session() -> NewSession {
        NewSession {
            device_fingerprint: "0123456789abcdefXYZ".to_string(),
            app_version: Some("1.0.0".to_string()),
            ip: "10.0.0.1".to_string(),
            trusted: true,
        }
    }

    #[test]
    fn test_create_session() {
        let mut store = SessionStore::new(600);

        let session = store.create_at(new_session(), 0);

        assert_eq!(session.expires_at, 600_000);
        assert_eq!(session.device_fingerprint_prefix, "0123456789abcdef***");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_validate_fresh_session() {
        let mut store = SessionStore::new(600);
        let session = store.create_at(new_session(), 0);

        let validated = store.validate_at(&session.token.to_string(), 599_000).unwrap();
        assert_eq!(validated, session);
    }

    #[test]
    fn test_validate_unknown_and_malformed() {
        let store = SessionStore::new(600);

        assert_eq!(
            store.validate_at(&Uuid::new_v4().to_string(), 0),
            Err(SessionError::Invalid)
        );
        assert_eq!(store.validate_at("not-a-token", 0), Err(SessionError::Invalid));
    }

    #[test]
    fn test_expired_session_is_kept() {
        let mut store = SessionStore::new(600);
        let token = store.create_at(new_session(), 0).token.to_string();

        assert_eq!(store.validate_at(&token, 600_001), Err(SessionError::Expired));
        // Lazy expiry: the record stays and keeps reporting Expired
        assert_eq!(store.len(), 1);
        assert_eq!(store.validate_at(&token, 900_000), Err(SessionError::Expired));
    }

    #[test]
    fn test_refresh_extends_window() {
        let mut store = SessionStore::new(600);
        let token = store.create_at(new_session(), 0).token.to_string();

        let refreshed = store.refresh_at(&token, 500_000).unwrap();
        assert_eq!(refreshed.expires_at, 1_100_000);

        assert!(store.validate_at(&token, 700_000).is_ok());
        assert!(store.validate_at(&token, 500_000 + 599_000).is_ok());
        assert_eq!(store.validate_at(&token, 1_100_001), Err(SessionError::Expired));
    }

    #[test]
    fn test_refresh_rejects_expired_and_unknown() {
        let mut store = SessionStore::new(600);
        let token = store.create_at(new_session(), 0).token.to_string();

        assert_eq!(store.refresh_at(&token, 700_000), Err(SessionError::Expired));
        assert_eq!(
            store.refresh_at(&Uuid::new_v4().to_string(), 0),
            Err(SessionError::Invalid)
        );
    }

    #[test]
    fn test_validate_right_after_handshake() {
        let mut store = SessionStore::new(600);
        let session = store.create(new_session());

        assert!(store.validate(&session.token.to_string()).is_ok());
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let mut store = SessionStore::new(u64::MAX);
        let session = store.create_at(new_session(), 5_000);
        assert_eq!(session.expires_at, u64::MAX);

        let token = session.token.to_string();
        let refreshed = tokio_test::assert_ok!(store.refresh_at(&token, 10_000));
        assert_eq!(refreshed.expires_at, u64::MAX);
    }

    #[test]
    fn test_mask_short_fingerprint() {
        assert_eq!(mask_fingerprint("abc"), "abc***");
    }
}
