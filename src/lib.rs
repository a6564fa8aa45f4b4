//! Session Gate Bot Library
//!
//! A Telegram bot that gates a video-download service behind time-limited
//! session tokens and a channel-membership check.
//!
//! This crate provides the core functionality for:
//! - Loading the bot configuration from the environment
//! - Issuing single-use tokens wrapped in verification links
//! - Activating sessions that expire on their own in the session store
//! - Checking required-channel membership via the Bot API
//! - Handling user and admin commands
//! - Serving a liveness endpoint

pub mod commands;
pub mod config;
pub mod context;
pub mod health;
pub mod session;
pub mod shortener;
pub mod store;
pub mod telegram;

#[cfg(test)]
mod testing;
