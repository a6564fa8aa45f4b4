//! Bot settings loaded from the environment.

use std::net::SocketAddr;

use super::{ChannelRef, ChannelRefError, DEFAULT_PENDING_TOKEN_TTL_SECS};

/// External URL shortener endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenerConfig {
    /// API endpoint, queried as `GET <api_url>?api=<key>&url=<long url>`.
    pub api_url: String,

    /// API key sent as the `api` query parameter.
    pub api_key: String,
}

/// Complete bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot API token (obtain from @BotFather).
    pub bot_token: String,

    /// Bot username without the leading `@`, used to build deep links.
    pub bot_username: String,

    /// User ids allowed to run admin commands.
    pub admins: Vec<u64>,

    /// Channels a user must have joined before a session is activated.
    pub required_channels: Vec<ChannelRef>,

    /// Session store URL. `None` selects the in-process store.
    pub redis_url: Option<String>,

    /// URL shortener. `None` hands out the bare deep link.
    pub shortener: Option<ShortenerConfig>,

    /// Lifetime of an unused pending token in seconds.
    pub pending_token_ttl_secs: u64,

    /// Key pattern purged by `/removeall`.
    pub media_key_pattern: String,

    /// Address the health endpoint listens on.
    pub health_addr: SocketAddr,
}

fn default_media_key_pattern() -> String {
    "media_*".to_owned()
}

fn default_health_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

impl BotConfig {
    /// Creates a configuration with defaults for everything but the credentials.
    #[must_use]
    pub fn new(bot_token: impl Into<String>, bot_username: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            bot_username: bot_username.into(),
            admins: Vec::new(),
            required_channels: Vec::new(),
            redis_url: None,
            shortener: None,
            pending_token_ttl_secs: DEFAULT_PENDING_TOKEN_TTL_SECS,
            media_key_pattern: default_media_key_pattern(),
            health_addr: default_health_addr(),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `BOT_TOKEN` and `BOT_USERNAME` to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or any value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or any value is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = non_empty("BOT_TOKEN").ok_or(ConfigError::MissingEnvVar("BOT_TOKEN"))?;
        let bot_username = non_empty("BOT_USERNAME")
            .ok_or(ConfigError::MissingEnvVar("BOT_USERNAME"))?
            .trim()
            .trim_start_matches('@')
            .to_owned();

        let mut config = Self::new(bot_token.trim(), bot_username);

        if let Some(raw) = non_empty("ADMINS") {
            config.admins = parse_admins(&raw)?;
        }

        if let Some(raw) = non_empty("FORCE_LINK") {
            config.required_channels =
                ChannelRef::parse_list(&raw).map_err(ConfigError::InvalidChannel)?;
        }

        config.redis_url = non_empty("REDIS_URL");

        if let Some(api_url) = non_empty("SHORTENER_API_URL") {
            let api_key = non_empty("SHORTENER_API_KEY")
                .ok_or(ConfigError::MissingEnvVar("SHORTENER_API_KEY"))?;
            config.shortener = Some(ShortenerConfig { api_url, api_key });
        }

        if let Some(raw) = non_empty("PENDING_TOKEN_TTL") {
            config.pending_token_ttl_secs = raw
                .trim()
                .parse()
                .ok()
                .filter(|&secs: &u64| secs > 0)
                .ok_or(ConfigError::InvalidNumber("PENDING_TOKEN_TTL", raw))?;
        }

        if let Some(pattern) = non_empty("MEDIA_KEY_PATTERN") {
            config.media_key_pattern = pattern;
        }

        if let Some(raw) = non_empty("HEALTH_ADDR") {
            config.health_addr = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidAddress(raw))?;
        } else if let Some(raw) = non_empty("PORT") {
            let port: u16 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("PORT", raw))?;
            config.health_addr = SocketAddr::from(([0, 0, 0, 0], port));
        }

        Ok(config)
    }

    /// Checks whether the given user may run admin commands.
    #[must_use]
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admins.contains(&user_id)
    }

    /// Deep link that starts the bot with the given token.
    #[must_use]
    pub fn token_deep_link(&self, token_id: &str) -> String {
        format!("https://t.me/{}?start=token_{token_id}", self.bot_username)
    }
}

fn parse_admins(raw: &str) -> Result<Vec<u64>, ConfigError> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| ConfigError::InvalidAdminId(s.to_owned()))
        })
        .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid admin user id: {0}")]
    InvalidAdminId(String),

    #[error("Invalid required channel: {0}")]
    InvalidChannel(#[source] ChannelRefError),

    #[error("Invalid value for {0}: {1} (must be a positive integer)")]
    InvalidNumber(&'static str, String),

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),
}
