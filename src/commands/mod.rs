//! Command handling module.
//!
//! Parses user commands sent to the bot, applies the private-chat and
//! administrator gates, and renders replies.

mod handler;
mod replies;
mod types;

pub use handler::{CommandHandler, Incoming};
pub use types::{BotCommand, CommandResult, CommandScope, LinkButton};
