//! Session store.
//!
//! All records live in a key-value store with per-key expiry:
//!
//! ```text
//! active_{user_id}   → activation unix timestamp   (expires after the session TTL)
//! token_{uuid}       → "{user_id}|{url}"            (expires after the pending TTL)
//! check_{user_id}    → admin marker                 (no expiry, written elsewhere)
//! ```

mod memory;
mod redis_store;

pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;

use async_trait::async_trait;
use thiserror::Error;

/// Key of the active-session marker for a user.
#[must_use]
pub fn active_key(user_id: u64) -> String {
    format!("active_{user_id}")
}

/// Key of a pending token record.
#[must_use]
pub fn token_key(token_id: &str) -> String {
    format!("token_{token_id}")
}

/// Key of the admin-removable marker.
#[must_use]
pub fn check_key(id: &str) -> String {
    format!("check_{id}")
}

/// Errors raised by a session store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Unexpected store reply: {0}")]
    UnexpectedReply(String),

    #[error("Invalid key pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),
}

/// A single-use credential bound to the user it was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToken {
    /// Token identifier embedded in the deep link.
    pub id: String,

    /// User the token was issued to.
    pub user_id: u64,

    /// Verification URL handed to the user.
    pub url: String,
}

impl PendingToken {
    /// Encodes the stored value as `"{user_id}|{url}"`.
    #[must_use]
    pub fn encode_value(&self) -> String {
        format!("{}|{}", self.user_id, self.url)
    }

    /// Decodes a stored value. Returns `None` for malformed records.
    #[must_use]
    pub fn decode(id: &str, value: &str) -> Option<Self> {
        let (user_id, url) = value.split_once('|')?;
        Some(Self {
            id: id.to_owned(),
            user_id: user_id.trim().parse().ok()?,
            url: url.to_owned(),
        })
    }
}

/// Result of the conditional activation transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationCommit {
    /// Token deleted and session created.
    Activated,

    /// No record exists for the token.
    TokenMissing,

    /// The token belongs to another user; nothing changed.
    ForeignToken,

    /// The user already has a session; nothing changed.
    AlreadyActive,
}

/// Storage for sessions, pending tokens and admin markers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Remaining lifetime of the user's session in seconds, `None` without a session.
    async fn session_ttl(&self, user_id: u64) -> Result<Option<u64>, StoreError>;

    /// Persists a pending token that expires after `ttl_secs`.
    async fn put_pending(&self, token: &PendingToken, ttl_secs: u64) -> Result<(), StoreError>;

    /// Looks up a pending token.
    async fn pending(&self, token_id: &str) -> Result<Option<PendingToken>, StoreError>;

    /// Atomically consumes the token and creates the user's session.
    ///
    /// The token must exist and belong to `user_id`, and the user must not
    /// already have a session. Otherwise nothing is modified.
    async fn activate(
        &self,
        token_id: &str,
        user_id: u64,
        activated_at: i64,
        ttl_secs: u64,
    ) -> Result<ActivationCommit, StoreError>;

    /// Deletes the admin marker for `id`, returning whether it existed.
    async fn remove_marker(&self, id: &str) -> Result<bool, StoreError>;

    /// Deletes every key matching a glob pattern, returning the number removed.
    async fn purge(&self, pattern: &str) -> Result<u64, StoreError>;
}
