//! Token issuance.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::SessionError;
use crate::context::AppContext;
use crate::store::PendingToken;

/// Result of a token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    /// The user already has a session; nothing was issued.
    AlreadyActive {
        /// Seconds until the session expires.
        remaining_secs: u64,
    },

    /// A new token was stored and its verification link created.
    Issued(PendingToken),
}

/// Issues pending tokens wrapped in verification links.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    ctx: Arc<AppContext>,
}

impl TokenIssuer {
    /// Creates a new token issuer.
    #[must_use]
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Issues a token for `user_id` unless the user already has a session.
    ///
    /// The token record is written only after the verification link exists,
    /// so the URL handed out always matches a stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or the shortener fails. Nothing is
    /// written when the shortener fails.
    pub async fn issue(&self, user_id: u64) -> Result<IssueOutcome, SessionError> {
        if let Some(remaining_secs) = self.ctx.store.session_ttl(user_id).await? {
            return Ok(IssueOutcome::AlreadyActive { remaining_secs });
        }

        let id = Uuid::new_v4().to_string();
        let deep_link = self.ctx.config.token_deep_link(&id);

        let url = self.ctx.shortener.shorten(&deep_link).await.map_err(|e| {
            warn!("Failed to shorten verification link for {}: {}", user_id, e);
            e
        })?;

        let token = PendingToken { id, user_id, url };
        self.ctx
            .store
            .put_pending(&token, self.ctx.config.pending_token_ttl_secs)
            .await?;

        info!("Issued token {} to user {}", token.id, user_id);
        Ok(IssueOutcome::Issued(token))
    }
}
