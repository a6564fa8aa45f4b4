//! Channel membership via `getChatMember`.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Recipient, UserId};
use tracing::{debug, warn};

use crate::config::ChannelRef;
use crate::session::MembershipGate;

/// Membership gate backed by the Bot API.
///
/// The bot must be an administrator of every required channel, otherwise
/// Telegram refuses the lookup and the user is treated as not joined.
#[derive(Debug, Clone)]
pub struct TelegramMembershipGate {
    bot: Bot,
    channels: Vec<ChannelRef>,
}

impl TelegramMembershipGate {
    /// Creates a gate for the given required channels.
    #[must_use]
    pub fn new(bot: Bot, channels: Vec<ChannelRef>) -> Self {
        Self { bot, channels }
    }

    async fn is_member_of(&self, channel: &ChannelRef, user_id: u64) -> bool {
        let chat = recipient(channel);

        match self.bot.get_chat_member(chat, UserId(user_id)).await {
            Ok(member) => {
                let present = member.kind.is_present();
                debug!("User {} in {}: present={}", user_id, channel, present);
                present
            }
            Err(e) => {
                warn!(
                    "Membership lookup for user {} in {} failed: {}",
                    user_id, channel, e
                );
                false
            }
        }
    }
}

fn recipient(channel: &ChannelRef) -> Recipient {
    match channel {
        ChannelRef::Username(name) => Recipient::ChannelUsername(format!("@{name}")),
        ChannelRef::Id(id) => Recipient::Id(ChatId(*id)),
    }
}

#[async_trait]
impl MembershipGate for TelegramMembershipGate {
    async fn is_member(&self, user_id: u64) -> bool {
        for channel in &self.channels {
            if !self.is_member_of(channel, user_id).await {
                return false;
            }
        }
        true
    }
}
