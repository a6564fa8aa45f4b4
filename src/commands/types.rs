//! Command types and definitions.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Matches the payload of a token-bearing `/start`.
static TOKEN_PAYLOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^token_([0-9a-f]{8}-[0-9a-f]{4}-[0-5][0-9a-f]{3}-[089ab][0-9a-f]{3}-[0-9a-f]{12})$",
    )
    .expect("token payload pattern is valid")
});

/// Who may run a command and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    /// Anyone, but only in a private chat with the bot.
    Private,

    /// Configured administrators, in any chat.
    Admin,
}

/// Available bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Show the welcome message.
    Start,

    /// Request a session token.
    Gen,

    /// Present a session token (`/start token_<uuid>`).
    StartToken(String),

    /// Remove a user's admin marker.
    Remove(String),

    /// Remove all tracked media.
    RemoveAll,
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Returns `None` if the message is not a valid command. A `@botname`
    /// suffix on the command word is ignored.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let after_slash = text.strip_prefix('/')?;

        let (word, args) = match after_slash.split_once(char::is_whitespace) {
            Some((word, args)) => (word, Some(args.trim()).filter(|a| !a.is_empty())),
            None => (after_slash, None),
        };
        let cmd = word.split_once('@').map_or(word, |(cmd, _)| cmd).to_lowercase();

        match (cmd.as_str(), args) {
            ("start", None) => Some(Self::Start),
            ("start", Some(payload)) => TOKEN_PAYLOAD
                .captures(payload)
                .map(|caps| Self::StartToken(caps[1].to_owned())),
            ("gen", None) => Some(Self::Gen),
            ("remove", Some(id)) => Some(Self::Remove(id.to_owned())),
            ("removeall", _) => Some(Self::RemoveAll),
            _ => None,
        }
    }

    /// Returns where and by whom the command may be used.
    #[must_use]
    pub const fn scope(&self) -> CommandScope {
        match self {
            Self::Start | Self::Gen | Self::StartToken(_) => CommandScope::Private,
            Self::Remove(_) | Self::RemoveAll => CommandScope::Admin,
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start | Self::StartToken(_) => "start",
            Self::Gen => "gen",
            Self::Remove(_) => "remove",
            Self::RemoveAll => "removeall",
        }
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartToken(token) => write!(f, "/start token_{token}"),
            Self::Remove(id) => write!(f, "/remove {id}"),
            _ => write!(f, "/{}", self.name()),
        }
    }
}

/// A button that opens a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    /// Button label.
    pub label: String,

    /// Target URL.
    pub url: String,
}

impl LinkButton {
    /// Creates a new link button.
    #[must_use]
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message (HTML) to show the user.
    pub message: String,

    /// Rows of link buttons attached to the reply.
    pub buttons: Vec<Vec<LinkButton>>,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            buttons: Vec::new(),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            buttons: Vec::new(),
        }
    }

    /// Attaches rows of link buttons, dropping empty rows.
    #[must_use]
    pub fn with_buttons(mut self, rows: Vec<Vec<LinkButton>>) -> Self {
        self.buttons = rows.into_iter().filter(|row| !row.is_empty()).collect();
        self
    }

    /// Iterates over all button URLs.
    pub fn button_urls(&self) -> impl Iterator<Item = &str> {
        self.buttons.iter().flatten().map(|b| b.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0b7c2f0e-1d2a-4c3b-8a9d-0123456789ab";

    #[test]
    fn test_parse_start() {
        assert_eq!(BotCommand::parse("/start"), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("  /start  "), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/start@gate_bot"), Some(BotCommand::Start));
    }

    #[test]
    fn test_parse_start_token() {
        assert_eq!(
            BotCommand::parse(&format!("/start token_{TOKEN}")),
            Some(BotCommand::StartToken(TOKEN.to_owned()))
        );
    }

    #[test]
    fn test_parse_start_malformed_payload() {
        assert_eq!(BotCommand::parse("/start hello"), None);
        assert_eq!(BotCommand::parse("/start token_1234"), None);
        assert_eq!(
            BotCommand::parse(&format!("/start token_{}", TOKEN.to_uppercase())),
            None
        );
        assert_eq!(BotCommand::parse(&format!("/start token_{TOKEN}x")), None);
    }

    #[test]
    fn test_parse_gen() {
        assert_eq!(BotCommand::parse("/gen"), Some(BotCommand::Gen));
        assert_eq!(BotCommand::parse("/GEN"), Some(BotCommand::Gen));
        assert_eq!(BotCommand::parse("/gen now"), None);
    }

    #[test]
    fn test_parse_remove() {
        assert_eq!(
            BotCommand::parse("/remove 12345"),
            Some(BotCommand::Remove("12345".to_owned()))
        );
        assert_eq!(BotCommand::parse("/remove"), None);
        assert_eq!(BotCommand::parse("/removeall"), Some(BotCommand::RemoveAll));
    }

    #[test]
    fn test_parse_not_a_command() {
        assert_eq!(BotCommand::parse("start"), None);
        assert_eq!(BotCommand::parse("https://example.com/video"), None);
        assert_eq!(BotCommand::parse("/help"), None);
    }

    #[test]
    fn test_scope() {
        assert_eq!(BotCommand::Gen.scope(), CommandScope::Private);
        assert_eq!(BotCommand::RemoveAll.scope(), CommandScope::Admin);
    }

    #[test]
    fn test_display() {
        assert_eq!(BotCommand::Gen.to_string(), "/gen");
        assert_eq!(BotCommand::Remove("9".to_owned()).to_string(), "/remove 9");
    }

    #[test]
    fn test_with_buttons_drops_empty_rows() {
        let result = CommandResult::success("hi")
            .with_buttons(vec![vec![], vec![LinkButton::new("a", "https://a")]]);
        assert_eq!(result.buttons.len(), 1);
        assert_eq!(result.button_urls().collect::<Vec<_>>(), vec!["https://a"]);
    }
}
