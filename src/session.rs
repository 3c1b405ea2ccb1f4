//! In-memory login sessions keyed by random tokens

use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

/// How long a session stays valid after login.
pub const SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

struct Session {
    username: String,
    created: Instant,
}

pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        SessionStore::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> SessionStore {
        SessionStore::default()
    }

    pub fn with_ttl(ttl: Duration) -> SessionStore {
        SessionStore {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Starts a session for `username` and returns its token.
    ///
    /// Expired sessions are swept first, so the table only holds sessions
    /// younger than the TTL plus the one just created.
    pub fn create(&self, username: &str) -> String {
        self.purge_expired();

        let token = generate_token();
        self.sessions.insert(token.clone(), Session {
            username: username.to_string(),
            created: Instant::now(),
        });
        token
    }

    /// User owning `token`, if the session exists and has not expired.
    pub fn username(&self, token: &str) -> Option<String> {
        let username = {
            let entry = self.sessions.get(token)?;
            if entry.created.elapsed() < self.ttl {
                return Some(entry.username.clone());
            }
            entry.username.clone()
        };

        self.sessions.remove(token);
        tracing::debug!(username, "session expired");
        None
    }

    /// Ends a session. Returns true if it existed.
    pub fn remove(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drops every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.created.elapsed() < self.ttl);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// 32 random bytes, hex encoded
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}
