//! Application context shared by all handlers.

use std::sync::Arc;

use crate::config::BotConfig;
use crate::session::MembershipGate;
use crate::shortener::UrlShortener;
use crate::store::SessionStore;

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct AppContext {
    /// Bot configuration.
    pub config: Arc<BotConfig>,

    /// Session store.
    pub store: Arc<dyn SessionStore>,

    /// Verification link shortener.
    pub shortener: Arc<dyn UrlShortener>,

    /// Required-channel membership check.
    pub gate: Arc<dyn MembershipGate>,
}

impl AppContext {
    /// Creates a new application context.
    #[must_use]
    pub fn new(
        config: BotConfig,
        store: Arc<dyn SessionStore>,
        shortener: Arc<dyn UrlShortener>,
        gate: Arc<dyn MembershipGate>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            shortener,
            gate,
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("bot_username", &self.config.bot_username)
            .finish_non_exhaustive()
    }
}
