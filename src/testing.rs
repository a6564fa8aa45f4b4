//! Test doubles shared by unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::BotConfig;
use crate::context::AppContext;
use crate::session::MembershipGate;
use crate::shortener::{PassthroughShortener, ShortenerError, UrlShortener};
use crate::store::{
    ActivationCommit, MemorySessionStore, PendingToken, SessionStore, StoreError, active_key,
    token_key,
};

pub const ADMIN_ID: u64 = 1;

/// Gate that admits only users who have "joined".
#[derive(Debug, Default)]
pub struct FakeGate {
    members: Mutex<HashSet<u64>>,
}

impl FakeGate {
    pub fn join(&self, user_id: u64) {
        self.members.lock().unwrap().insert(user_id);
    }
}

#[async_trait]
impl MembershipGate for FakeGate {
    async fn is_member(&self, user_id: u64) -> bool {
        self.members.lock().unwrap().contains(&user_id)
    }
}

/// Shortener that is always unreachable.
#[derive(Debug, Default)]
pub struct FailingShortener;

#[async_trait]
impl UrlShortener for FailingShortener {
    async fn shorten(&self, _long_url: &str) -> Result<String, ShortenerError> {
        Err(ShortenerError::EmptyResult)
    }
}

/// What another request does between the activator's checks and its commit.
#[derive(Debug, Clone, Copy)]
pub enum Race {
    /// The token is consumed elsewhere.
    TokenConsumed,
    /// The token record is replaced by one owned by `owner`.
    TokenReassigned { owner: u64 },
    /// A session for the presenting user is opened elsewhere.
    SessionOpened,
}

/// Memory store that lets a concurrent change land right before `activate`.
pub struct RacingStore {
    inner: Arc<MemorySessionStore>,
    race: Race,
}

impl RacingStore {
    pub fn new(inner: Arc<MemorySessionStore>, race: Race) -> Self {
        Self { inner, race }
    }
}

#[async_trait]
impl SessionStore for RacingStore {
    async fn session_ttl(&self, user_id: u64) -> Result<Option<u64>, StoreError> {
        self.inner.session_ttl(user_id).await
    }

    async fn put_pending(&self, token: &PendingToken, ttl_secs: u64) -> Result<(), StoreError> {
        self.inner.put_pending(token, ttl_secs).await
    }

    async fn pending(&self, token_id: &str) -> Result<Option<PendingToken>, StoreError> {
        self.inner.pending(token_id).await
    }

    async fn activate(
        &self,
        token_id: &str,
        user_id: u64,
        activated_at: i64,
        ttl_secs: u64,
    ) -> Result<ActivationCommit, StoreError> {
        match self.race {
            Race::TokenConsumed => {
                self.inner.purge(&token_key(token_id)).await?;
            }
            Race::TokenReassigned { owner } => {
                let token = PendingToken {
                    id: token_id.to_owned(),
                    user_id: owner,
                    url: "https://short.example/other".to_owned(),
                };
                self.inner.put_pending(&token, 600).await?;
            }
            Race::SessionOpened => {
                self.inner
                    .insert(active_key(user_id), "0", Some(Duration::from_secs(1800)))
                    .await;
            }
        }

        self.inner
            .activate(token_id, user_id, activated_at, ttl_secs)
            .await
    }

    async fn remove_marker(&self, id: &str) -> Result<bool, StoreError> {
        self.inner.remove_marker(id).await
    }

    async fn purge(&self, pattern: &str) -> Result<u64, StoreError> {
        self.inner.purge(pattern).await
    }
}

/// In-memory wiring of an [`AppContext`].
pub struct TestContext {
    pub store: Arc<MemorySessionStore>,
    pub gate: Arc<FakeGate>,
    shortener: Arc<dyn UrlShortener>,
    config: BotConfig,
}

impl TestContext {
    pub fn new() -> Self {
        let mut config = BotConfig::new("123:abc", "gate_bot");
        config.admins = vec![ADMIN_ID];

        Self {
            store: Arc::new(MemorySessionStore::new()),
            gate: Arc::new(FakeGate::default()),
            shortener: Arc::new(PassthroughShortener),
            config,
        }
    }

    pub fn with_failing_shortener(mut self) -> Self {
        self.shortener = Arc::new(FailingShortener);
        self
    }

    pub fn ctx(&self) -> Arc<AppContext> {
        Arc::new(AppContext::new(
            self.config.clone(),
            self.store.clone(),
            Arc::clone(&self.shortener),
            self.gate.clone(),
        ))
    }

    /// Same wiring, but with a store that races the activation commit.
    pub fn ctx_racing(&self, race: Race) -> Arc<AppContext> {
        Arc::new(AppContext::new(
            self.config.clone(),
            Arc::new(RacingStore::new(Arc::clone(&self.store), race)),
            Arc::clone(&self.shortener),
            self.gate.clone(),
        ))
    }
}
