//! Reply texts.

use super::types::{CommandResult, LinkButton};
use crate::config::BotConfig;
use crate::session::humanize_secs;

/// Escapes text for Telegram's HTML parse mode.
pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// One join button per required channel that has a public link.
fn join_buttons(config: &BotConfig) -> Vec<LinkButton> {
    config
        .required_channels
        .iter()
        .filter_map(|channel| {
            channel
                .join_url()
                .map(|url| LinkButton::new(format!("📢 {channel}"), url))
        })
        .collect()
}

pub(crate) fn welcome(config: &BotConfig) -> CommandResult {
    let message = "Hello there! I'm your friendly video downloader bot.\n\n\
         Share a <b>video link</b> with me and I'll get started on downloading it for you.\n\n\
         🔑 Use /gen to refresh your session token.\n\n\
         Happy downloading! 🚀";

    CommandResult::success(message).with_buttons(vec![join_buttons(config)])
}

pub(crate) fn already_active(remaining_secs: u64) -> CommandResult {
    CommandResult::success(format!(
        "✅ You are already active.\n⏳ <b>Session expires in</b>: {}",
        humanize_secs(remaining_secs)
    ))
}

pub(crate) fn token_issued(display_name: &str, url: &str) -> CommandResult {
    let message = format!(
        "👋 <b>Hey {}!</b>\n\n\
         🔄 Your <b>session token has expired</b>. Please refresh your token to continue using the bot.\n\n\
         ⏳ <b>Token Timeout</b>: 1 hour\n\n\
         👉 <b>Why do I need this?</b>\n\
         After viewing an ad, you can use the bot <b>for 1 hour</b> without restrictions.\n\n\
         🔄 <b>Click below to refresh your session:</b>",
        escape_html(display_name)
    );

    CommandResult::success(message)
        .with_buttons(vec![vec![LinkButton::new("Refresh Token 🔄", url)]])
}

pub(crate) fn transient_failure() -> CommandResult {
    CommandResult::error("⚠️ Something went wrong. Please try again.")
}

pub(crate) fn not_member(config: &BotConfig, token_id: &str) -> CommandResult {
    let channels = config
        .required_channels
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" or ");

    CommandResult::error(format!(
        "⚠️ You haven't joined {channels} yet. <b>Please join and try again!</b>"
    ))
    .with_buttons(vec![
        join_buttons(config),
        vec![LinkButton::new("🔄 ReCheck", config.token_deep_link(token_id))],
    ])
}

pub(crate) fn foreign_token() -> CommandResult {
    CommandResult::error("⚠️ Your token is invalid. <b>Request a new one using /gen</b>")
}

pub(crate) fn activated(expires_in_secs: u64) -> CommandResult {
    CommandResult::success(format!(
        "✅ <b>Your account is now active!</b>\n⏳ <b>Expires in {}.</b>",
        humanize_secs(expires_in_secs)
    ))
}

pub(crate) fn marker_removed(id: &str) -> CommandResult {
    CommandResult::success(format!("✅ Removed {} from the list.", escape_html(id)))
}

pub(crate) fn marker_missing(id: &str) -> CommandResult {
    CommandResult::error(format!("⚠️ {} is not in the list.", escape_html(id)))
}

pub(crate) fn removed_all() -> CommandResult {
    CommandResult::success("✅ Removed all videos from the list.")
}
