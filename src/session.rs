use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Debug)]
struct Session {
    created_at: DateTime<Utc>,
}

/// Server-side table of admin session tokens. Tokens are random UUIDs
/// handed out at login and expire after a fixed TTL.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Mint a new session and return its token.
    pub fn create(&self) -> String {
        let token = Uuid::new_v4().to_string();
        self.sessions.write().unwrap().insert(
            token.clone(),
            Session {
                created_at: Utc::now(),
            },
        );
        token
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.sessions
            .read()
            .unwrap()
            .get(token)
            .map(|session| Utc::now() - session.created_at < self.ttl)
            .unwrap_or(false)
    }

    pub fn remove(&self, token: &str) {
        self.sessions.write().unwrap().remove(token);
    }

    /// Drop sessions past their TTL and report how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, session| Utc::now() - session.created_at < self.ttl);
        before - sessions.len()
    }
}

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// An empty stored hash never matches, so an unconfigured deployment
/// cannot be logged into.
pub fn verify_password(password: &str, expected_hash: &str) -> bool {
    !expected_hash.is_empty() && hash_password(password) == expected_hash
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn created_sessions_are_valid() {
        let store = SessionStore::new(24);
        let token = store.create();
        assert!(store.is_valid(&token));
    }

    #[test]
    fn unknown_tokens_are_invalid() {
        let store = SessionStore::new(24);
        assert!(!store.is_valid("not-a-token"));
    }

    #[test]
    fn removed_sessions_are_invalid() {
        let store = SessionStore::new(24);
        let token = store.create();
        store.remove(&token);
        assert!(!store.is_valid(&token));
    }

    #[test]
    fn sessions_expire_after_the_ttl() {
        let store = SessionStore::new(24);
        let token = store.create();
        store.sessions.write().unwrap().insert(
            token.clone(),
            Session {
                created_at: Utc::now() - Duration::hours(25),
            },
        );

        assert!(!store.is_valid(&token));
    }

    #[test]
    fn cleanup_removes_only_expired_sessions() {
        let store = SessionStore::new(24);
        let stale = store.create();
        let fresh = store.create();
        store.sessions.write().unwrap().insert(
            stale.clone(),
            Session {
                created_at: Utc::now() - Duration::hours(25),
            },
        );

        assert_eq!(store.cleanup_expired(), 1);
        assert!(!store.is_valid(&stale));
        assert!(store.is_valid(&fresh));
    }

    #[test]
    fn password_hash_is_sha256_hex() {
        assert_eq!(
            hash_password("123"),
            "a665a45920422f9d417e4867efdc4fb8a04a1f3fff1fa07e998e86f7f7a27ae3"
        );
    }

    #[test]
    fn verification_compares_against_the_stored_hash() {
        let expected = hash_password("letmein");
        assert!(verify_password("letmein", &expected));
        assert!(!verify_password("wrong", &expected));
    }

    #[test]
    fn empty_stored_hash_rejects_everything() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("", ""));
    }
}
