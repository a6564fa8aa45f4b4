//! Session activation.
//!
//! Checks run in a fixed order for every `/start token_<uuid>`:
//! 1. membership in all required channels
//! 2. an existing session short-circuits (idempotent)
//! 3. an unknown token falls back to issuing a new one
//! 4. a token issued to someone else is rejected
//! 5. the store consumes the token and opens the session atomically

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{IssueOutcome, SessionError, TokenIssuer};
use crate::config::SESSION_TTL_SECS;
use crate::context::AppContext;
use crate::store::ActivationCommit;

/// Result of presenting a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// The user has not joined the required channels; nothing changed.
    NotMember,

    /// The user already had a session; nothing changed.
    AlreadyActive {
        /// Seconds until the session expires.
        remaining_secs: u64,
    },

    /// The token was unknown or expired, so a token request was made instead.
    Reissued(IssueOutcome),

    /// The token was issued to a different user; nothing changed.
    ForeignToken,

    /// The token was consumed and a session opened.
    Activated {
        /// Lifetime of the new session in seconds.
        expires_in_secs: u64,
    },
}

/// Turns pending tokens into active sessions.
#[derive(Debug, Clone)]
pub struct SessionActivator {
    ctx: Arc<AppContext>,
    issuer: TokenIssuer,
}

impl SessionActivator {
    /// Creates a new session activator.
    #[must_use]
    pub fn new(ctx: Arc<AppContext>) -> Self {
        let issuer = TokenIssuer::new(Arc::clone(&ctx));
        Self { ctx, issuer }
    }

    /// Validates `token_id` for `user_id` and opens a session on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails, or if the fallback token request
    /// for an unknown token fails.
    pub async fn activate(
        &self,
        user_id: u64,
        token_id: &str,
    ) -> Result<ActivationOutcome, SessionError> {
        if !self.ctx.gate.is_member(user_id).await {
            debug!("User {} has not joined the required channels", user_id);
            return Ok(ActivationOutcome::NotMember);
        }

        let store = &self.ctx.store;

        if let Some(remaining_secs) = store.session_ttl(user_id).await? {
            return Ok(ActivationOutcome::AlreadyActive { remaining_secs });
        }

        let Some(token) = store.pending(token_id).await? else {
            debug!("Unknown token {} from user {}, issuing a new one", token_id, user_id);
            return self.reissue(user_id).await;
        };

        if token.user_id != user_id {
            warn!(
                "User {} presented token {} issued to another user",
                user_id, token_id
            );
            return Ok(ActivationOutcome::ForeignToken);
        }

        let activated_at = chrono::Utc::now().timestamp();
        match store
            .activate(token_id, user_id, activated_at, SESSION_TTL_SECS)
            .await?
        {
            ActivationCommit::Activated => {
                info!("Activated session for user {}", user_id);
                Ok(ActivationOutcome::Activated {
                    expires_in_secs: SESSION_TTL_SECS,
                })
            }
            // The record changed between the checks above and the commit.
            ActivationCommit::TokenMissing => self.reissue(user_id).await,
            ActivationCommit::ForeignToken => Ok(ActivationOutcome::ForeignToken),
            ActivationCommit::AlreadyActive => {
                let remaining_secs = store.session_ttl(user_id).await?.unwrap_or(0);
                Ok(ActivationOutcome::AlreadyActive { remaining_secs })
            }
        }
    }

    async fn reissue(&self, user_id: u64) -> Result<ActivationOutcome, SessionError> {
        let outcome = self.issuer.issue(user_id).await?;
        Ok(ActivationOutcome::Reissued(outcome))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::{PendingToken, SessionStore};
    use crate::testing::{Race, TestContext};

    async fn issue(test: &TestContext, user_id: u64) -> PendingToken {
        match TokenIssuer::new(test.ctx()).issue(user_id).await.unwrap() {
            IssueOutcome::Issued(token) => token,
            other => panic!("expected a new token, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_member_is_rejected_without_mutation() {
        let test = TestContext::new();
        let token = issue(&test, 7).await;
        let activator = SessionActivator::new(test.ctx());

        assert_eq!(
            activator.activate(7, &token.id).await.unwrap(),
            ActivationOutcome::NotMember
        );
        assert_eq!(test.store.pending(&token.id).await.unwrap(), Some(token));
        assert_eq!(test.store.session_ttl(7).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_consumes_token() {
        let test = TestContext::new();
        test.gate.join(7);
        let token = issue(&test, 7).await;
        let activator = SessionActivator::new(test.ctx());

        assert_eq!(
            activator.activate(7, &token.id).await.unwrap(),
            ActivationOutcome::Activated {
                expires_in_secs: 3600
            }
        );
        assert_eq!(test.store.pending(&token.id).await.unwrap(), None);
        assert_eq!(test.store.session_ttl(7).await.unwrap(), Some(3600));
    }

    #[tokio::test]
    async fn test_foreign_token_creates_no_session() {
        let test = TestContext::new();
        test.gate.join(7);
        test.gate.join(8);
        let token = issue(&test, 7).await;
        let activator = SessionActivator::new(test.ctx());

        assert_eq!(
            activator.activate(8, &token.id).await.unwrap(),
            ActivationOutcome::ForeignToken
        );
        assert_eq!(test.store.session_ttl(7).await.unwrap(), None);
        assert_eq!(test.store.session_ttl(8).await.unwrap(), None);
        assert_eq!(test.store.pending(&token.id).await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn test_unknown_token_reissues() {
        let test = TestContext::new();
        test.gate.join(7);
        let activator = SessionActivator::new(test.ctx());

        let outcome = activator
            .activate(7, "0b7c2f0e-1d2a-4c3b-8a9d-0123456789ab")
            .await
            .unwrap();

        let ActivationOutcome::Reissued(IssueOutcome::Issued(token)) = outcome else {
            panic!("expected a reissued token, got {outcome:?}");
        };
        assert_eq!(token.user_id, 7);
        assert_eq!(test.store.pending(&token.id).await.unwrap(), Some(token));
        assert_eq!(test.store.session_ttl(7).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_session_is_idempotent() {
        let test = TestContext::new();
        test.gate.join(7);
        let first = issue(&test, 7).await;
        let second = issue(&test, 7).await;
        let activator = SessionActivator::new(test.ctx());

        activator.activate(7, &first.id).await.unwrap();
        tokio::time::advance(Duration::from_secs(90)).await;

        assert_eq!(
            activator.activate(7, &second.id).await.unwrap(),
            ActivationOutcome::AlreadyActive {
                remaining_secs: 3510
            }
        );
        assert_eq!(test.store.pending(&second.id).await.unwrap(), Some(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_expires_after_an_hour() {
        let test = TestContext::new();
        test.gate.join(7);
        let token = issue(&test, 7).await;
        let activator = SessionActivator::new(test.ctx());

        activator.activate(7, &token.id).await.unwrap();
        tokio::time::advance(Duration::from_secs(SESSION_TTL_SECS)).await;

        assert_eq!(test.store.session_ttl(7).await.unwrap(), None);
        assert!(matches!(
            TokenIssuer::new(test.ctx()).issue(7).await.unwrap(),
            IssueOutcome::Issued(_)
        ));
    }

    #[tokio::test]
    async fn test_token_consumed_before_commit_reissues() {
        let test = TestContext::new();
        test.gate.join(7);
        let token = issue(&test, 7).await;
        let activator = SessionActivator::new(test.ctx_racing(Race::TokenConsumed));

        let outcome = activator.activate(7, &token.id).await.unwrap();

        let ActivationOutcome::Reissued(IssueOutcome::Issued(fresh)) = outcome else {
            panic!("expected a reissued token, got {outcome:?}");
        };
        assert_ne!(fresh.id, token.id);
        assert_eq!(test.store.pending(&token.id).await.unwrap(), None);
        assert_eq!(test.store.session_ttl(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_token_reassigned_before_commit_is_foreign() {
        let test = TestContext::new();
        test.gate.join(7);
        let token = issue(&test, 7).await;
        let activator =
            SessionActivator::new(test.ctx_racing(Race::TokenReassigned { owner: 8 }));

        assert_eq!(
            activator.activate(7, &token.id).await.unwrap(),
            ActivationOutcome::ForeignToken
        );
        assert_eq!(test.store.session_ttl(7).await.unwrap(), None);
        assert!(test.store.pending(&token.id).await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_opened_before_commit_reports_remaining_time() {
        let test = TestContext::new();
        test.gate.join(7);
        let token = issue(&test, 7).await;
        let activator = SessionActivator::new(test.ctx_racing(Race::SessionOpened));

        assert_eq!(
            activator.activate(7, &token.id).await.unwrap(),
            ActivationOutcome::AlreadyActive {
                remaining_secs: 1800
            }
        );
        assert_eq!(test.store.pending(&token.id).await.unwrap(), Some(token));
    }
}
