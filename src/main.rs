//! Session Gate Bot - Main Entry Point
//!
//! A Telegram bot that hands out time-limited sessions to users who
//! verify a token and have joined the required channels.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use teloxide::prelude::*;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use session_gate_bot::commands::CommandHandler;
use session_gate_bot::config::BotConfig;
use session_gate_bot::context::AppContext;
use session_gate_bot::health;
use session_gate_bot::shortener::{HttpShortener, PassthroughShortener, UrlShortener};
use session_gate_bot::store::{MemorySessionStore, RedisSessionStore, SessionStore};
use session_gate_bot::telegram::{TelegramMembershipGate, run_dispatcher};

/// Telegram bot gating access behind time-limited session tokens.
#[derive(Parser, Debug)]
#[command(name = "session_gate_bot")]
#[command(about = "Gate bot access behind session tokens and channel membership")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Address for the health endpoint (overrides HEALTH_ADDR and PORT).
    #[arg(long)]
    health_addr: Option<SocketAddr>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let mut config =
        BotConfig::from_env().context("Failed to load bot configuration from environment")?;
    if let Some(addr) = args.health_addr {
        config.health_addr = addr;
    }

    info!(
        "Loaded configuration ({} admins, {} required channels)",
        config.admins.len(),
        config.required_channels.len()
    );

    // The health endpoint shares nothing with the bot and runs on its own thread
    let _health = health::spawn(config.health_addr).context("Failed to start health endpoint")?;

    let store: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisSessionStore::connect(url)
                .await
                .context("Failed to connect to session store")?,
        ),
        None => {
            warn!("REDIS_URL not set, sessions are kept in memory and lost on restart");
            Arc::new(MemorySessionStore::new())
        }
    };

    let shortener: Arc<dyn UrlShortener> = match config.shortener.clone() {
        Some(shortener) => {
            Arc::new(HttpShortener::new(shortener).context("Failed to build shortener client")?)
        }
        None => {
            warn!("No shortener configured, handing out plain deep links");
            Arc::new(PassthroughShortener)
        }
    };

    // Connect to Telegram
    let bot = Bot::new(&config.bot_token);
    let me = bot.get_me().await.context("Failed to connect to Telegram")?;
    let username = me.user.username.clone().unwrap_or_default();
    info!("Connected to Telegram as @{}", username);

    if !username.eq_ignore_ascii_case(&config.bot_username) {
        warn!(
            "BOT_USERNAME is {} but the token belongs to @{}; deep links will point to the configured name",
            config.bot_username, username
        );
    }

    let gate = Arc::new(TelegramMembershipGate::new(
        bot.clone(),
        config.required_channels.clone(),
    ));

    let ctx = Arc::new(AppContext::new(config, store, shortener, gate));
    let handler = Arc::new(CommandHandler::new(ctx));

    info!("Bot is running. Use Ctrl+C to stop.");

    tokio::select! {
        () = run_dispatcher(bot, handler) => {
            info!("Dispatcher stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
