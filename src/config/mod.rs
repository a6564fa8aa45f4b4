//! Configuration module for the session gate bot.
//!
//! Handles loading and validation of the bot configuration
//! including credentials, administrators and required channels.

mod channels;
mod settings;

pub use channels::{ChannelRef, ChannelRefError};
pub use settings::{BotConfig, ConfigError, ShortenerConfig};

/// Lifetime of an active session in seconds.
pub const SESSION_TTL_SECS: u64 = 3600;

/// Default lifetime of an unused pending token in seconds.
pub const DEFAULT_PENDING_TOKEN_TTL_SECS: u64 = 86_400;
