//! Telegram Bot API front-end.
//!
//! Receives messages, hands them to the command handler, and sends the
//! replies back. Also implements the channel membership gate on top of
//! `getChatMember`.

mod dispatch;
mod membership;

pub use dispatch::{inline_keyboard, run_dispatcher};
pub use membership::TelegramMembershipGate;
