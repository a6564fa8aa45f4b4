//! Command handler implementation.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::replies;
use super::types::{BotCommand, CommandResult, CommandScope};
use crate::context::AppContext;
use crate::session::{
    ActivationOutcome, IssueOutcome, SessionActivator, SessionError, TokenIssuer,
};

/// An incoming text message, stripped of transport details.
#[derive(Debug, Clone, Copy)]
pub struct Incoming<'a> {
    /// Sender's user id.
    pub user_id: u64,

    /// Name used to greet the sender.
    pub display_name: &'a str,

    /// Whether the message was sent in a private chat with the bot.
    pub is_private: bool,

    /// Message text.
    pub text: &'a str,
}

/// Dispatches commands to the token issuer, session activator and admin actions.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    ctx: Arc<AppContext>,
    issuer: TokenIssuer,
    activator: SessionActivator,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            issuer: TokenIssuer::new(Arc::clone(&ctx)),
            activator: SessionActivator::new(Arc::clone(&ctx)),
            ctx,
        }
    }

    /// Tries to parse and execute a command from a message.
    ///
    /// Returns `None` if the message is not a command, or if the sender is
    /// not allowed to use it here. Unauthorized commands get no reply.
    pub async fn try_handle(&self, msg: &Incoming<'_>) -> Option<CommandResult> {
        let command = BotCommand::parse(msg.text)?;

        match command.scope() {
            CommandScope::Private if !msg.is_private => {
                debug!("Ignoring {} outside a private chat", command.name());
                return None;
            }
            CommandScope::Admin if !self.ctx.config.is_admin(msg.user_id) => {
                debug!("Ignoring {} from non-admin {}", command.name(), msg.user_id);
                return None;
            }
            _ => {}
        }

        debug!("Handling command {} from {}", command, msg.user_id);
        let result = self.execute(command, msg).await;
        info!(
            "Command result for {}: success={}",
            msg.user_id, result.success
        );

        Some(result)
    }

    /// Executes a parsed command.
    async fn execute(&self, command: BotCommand, msg: &Incoming<'_>) -> CommandResult {
        match command {
            BotCommand::Start => replies::welcome(&self.ctx.config),
            BotCommand::Gen => self.handle_gen(msg).await,
            BotCommand::StartToken(token_id) => self.handle_token(msg, &token_id).await,
            BotCommand::Remove(id) => self.handle_remove(&id).await,
            BotCommand::RemoveAll => self.handle_remove_all().await,
        }
    }

    async fn handle_gen(&self, msg: &Incoming<'_>) -> CommandResult {
        match self.issuer.issue(msg.user_id).await {
            Ok(outcome) => issue_reply(&outcome, msg.display_name),
            Err(e) => failure_reply(&e),
        }
    }

    async fn handle_token(&self, msg: &Incoming<'_>, token_id: &str) -> CommandResult {
        match self.activator.activate(msg.user_id, token_id).await {
            Ok(ActivationOutcome::NotMember) => replies::not_member(&self.ctx.config, token_id),
            Ok(ActivationOutcome::AlreadyActive { remaining_secs }) => {
                replies::already_active(remaining_secs)
            }
            Ok(ActivationOutcome::Reissued(outcome)) => issue_reply(&outcome, msg.display_name),
            Ok(ActivationOutcome::ForeignToken) => replies::foreign_token(),
            Ok(ActivationOutcome::Activated { expires_in_secs }) => {
                replies::activated(expires_in_secs)
            }
            Err(e) => failure_reply(&e),
        }
    }

    async fn handle_remove(&self, id: &str) -> CommandResult {
        match self.ctx.store.remove_marker(id).await {
            Ok(true) => {
                info!("Removed marker for {}", id);
                replies::marker_removed(id)
            }
            Ok(false) => replies::marker_missing(id),
            Err(e) => {
                error!("Failed to remove marker for {}: {}", id, e);
                replies::transient_failure()
            }
        }
    }

    async fn handle_remove_all(&self) -> CommandResult {
        let pattern = &self.ctx.config.media_key_pattern;
        match self.ctx.store.purge(pattern).await {
            Ok(count) => info!("Purged {} media records", count),
            Err(e) => error!("Failed to purge media records: {}", e),
        }

        replies::removed_all()
    }
}

fn issue_reply(outcome: &IssueOutcome, display_name: &str) -> CommandResult {
    match outcome {
        IssueOutcome::AlreadyActive { remaining_secs } => replies::already_active(*remaining_secs),
        IssueOutcome::Issued(token) => replies::token_issued(display_name, &token.url),
    }
}

fn failure_reply(err: &SessionError) -> CommandResult {
    match err {
        SessionError::Shortener(e) => warn!("Token request failed: {}", e),
        SessionError::Store(e) => error!("Session store failure: {}", e),
    }
    replies::transient_failure()
}
