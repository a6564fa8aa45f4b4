//! In-process session store.
//!
//! Keeps the same key layout and expiry semantics as the Redis store, but
//! everything is lost on restart. Deadlines use the tokio clock so expiry
//! can be driven from tests with a paused runtime.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{
    ActivationCommit, PendingToken, SessionStore, StoreError, active_key, check_key, token_key,
};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }

    /// Remaining lifetime rounded to the nearest second, as Redis `TTL` reports it.
    fn remaining_secs(&self, now: Instant) -> u64 {
        self.expires_at.map_or(0, |at| {
            let millis = at.saturating_duration_since(now).as_millis();
            u64::try_from(millis.saturating_add(500) / 1000).unwrap_or(u64::MAX)
        })
    }
}

/// Session store held in process memory.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a raw key, optionally with an expiry.
    ///
    /// Expired keys are dropped on every write.
    pub async fn insert(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        ttl: Option<Duration>,
    ) {
        let now = Instant::now();
        let entry = Entry {
            value: value.into(),
            expires_at: ttl.map(|ttl| now + ttl),
        };

        let mut entries = self.entries.lock().await;
        sweep(&mut entries, now);
        entries.insert(key.into(), entry);
    }

    /// Reads a raw key if it has not expired.
    pub async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    /// Returns `true` if no live keys remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of stored keys, expired or not.
    #[cfg(test)]
    async fn raw_len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

fn sweep(entries: &mut HashMap<String, Entry>, now: Instant) {
    entries.retain(|_, entry| entry.is_live(now));
}

/// Removes the entry if it has expired, then returns the live entry.
fn live_entry<'a>(
    entries: &'a mut HashMap<String, Entry>,
    key: &str,
    now: Instant,
) -> Option<&'a Entry> {
    if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
        entries.remove(key);
    }
    entries.get(key)
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn session_ttl(&self, user_id: u64) -> Result<Option<u64>, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        Ok(live_entry(&mut entries, &active_key(user_id), now)
            .map(|entry| entry.remaining_secs(now)))
    }

    async fn put_pending(&self, token: &PendingToken, ttl_secs: u64) -> Result<(), StoreError> {
        self.insert(
            token_key(&token.id),
            token.encode_value(),
            Some(Duration::from_secs(ttl_secs)),
        )
        .await;
        Ok(())
    }

    async fn pending(&self, token_id: &str) -> Result<Option<PendingToken>, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;

        Ok(live_entry(&mut entries, &token_key(token_id), now)
            .and_then(|entry| PendingToken::decode(token_id, &entry.value)))
    }

    async fn activate(
        &self,
        token_id: &str,
        user_id: u64,
        activated_at: i64,
        ttl_secs: u64,
    ) -> Result<ActivationCommit, StoreError> {
        let now = Instant::now();
        let token_key = token_key(token_id);
        let active_key = active_key(user_id);
        let mut entries = self.entries.lock().await;

        let Some(entry) = live_entry(&mut entries, &token_key, now) else {
            return Ok(ActivationCommit::TokenMissing);
        };

        let owner = entry
            .value
            .split_once('|')
            .and_then(|(owner, _)| owner.parse::<u64>().ok());
        if owner != Some(user_id) {
            return Ok(ActivationCommit::ForeignToken);
        }

        if live_entry(&mut entries, &active_key, now).is_some() {
            return Ok(ActivationCommit::AlreadyActive);
        }

        entries.remove(&token_key);
        sweep(&mut entries, now);
        entries.insert(
            active_key,
            Entry {
                value: activated_at.to_string(),
                expires_at: Some(now + Duration::from_secs(ttl_secs)),
            },
        );

        Ok(ActivationCommit::Activated)
    }

    async fn remove_marker(&self, id: &str) -> Result<bool, StoreError> {
        let now = Instant::now();
        let key = check_key(id);
        let mut entries = self.entries.lock().await;

        let existed = live_entry(&mut entries, &key, now).is_some();
        entries.remove(&key);
        Ok(existed)
    }

    async fn purge(&self, pattern: &str) -> Result<u64, StoreError> {
        let pattern = glob::Pattern::new(pattern)?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        sweep(&mut entries, now);

        let before = entries.len();
        entries.retain(|key, _| !pattern.matches(key));

        Ok((before - entries.len()) as u64)
    }
}
