//! Update dispatching.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, ReplyParameters};
use tracing::{debug, info, warn};

use crate::commands::{CommandHandler, CommandResult, Incoming, LinkButton};

/// Runs the bot until the update stream ends.
///
/// Every update goes through a single distribution key, so handlers run
/// strictly one after another.
pub async fn run_dispatcher(bot: Bot, handler: Arc<CommandHandler>) {
    let schema = Update::filter_message().endpoint(on_message);

    info!("Starting update dispatcher");

    Dispatcher::builder(bot, schema)
        .dependencies(dptree::deps![handler])
        .distribution_function(|_: &Update| Some(()))
        .default_handler(|_| async {})
        .build()
        .dispatch()
        .await;
}

async fn on_message(bot: Bot, msg: Message, handler: Arc<CommandHandler>) -> ResponseResult<()> {
    let (Some(text), Some(from)) = (msg.text(), msg.from.as_ref()) else {
        return Ok(());
    };

    let display_name = if from.first_name.is_empty() {
        from.username.as_deref().unwrap_or("there")
    } else {
        from.first_name.as_str()
    };

    let incoming = Incoming {
        user_id: from.id.0,
        display_name,
        is_private: msg.chat.is_private(),
        text,
    };

    let Some(result) = handler.try_handle(&incoming).await else {
        return Ok(());
    };

    send_reply(&bot, &msg, result).await
}

async fn send_reply(bot: &Bot, msg: &Message, result: CommandResult) -> ResponseResult<()> {
    let keyboard = inline_keyboard(&result.buttons);

    let mut request = bot
        .send_message(msg.chat.id, result.message)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id));

    if let Some(keyboard) = keyboard {
        request = request.reply_markup(keyboard);
    }

    request.await?;
    debug!("Replied in chat {}", msg.chat.id);
    Ok(())
}

/// Converts rows of link buttons into an inline keyboard.
///
/// Buttons with unparsable URLs are skipped. Returns `None` when nothing is left.
#[must_use]
pub fn inline_keyboard(rows: &[Vec<LinkButton>]) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<InlineKeyboardButton>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .filter_map(|button| match reqwest::Url::parse(&button.url) {
                    Ok(url) => Some(InlineKeyboardButton::url(button.label.clone(), url)),
                    Err(e) => {
                        warn!("Skipping button {:?} with invalid URL: {}", button.label, e);
                        None
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();

    (!rows.is_empty()).then(|| InlineKeyboardMarkup::new(rows))
}
