//! Required channel references.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while parsing a channel reference.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelRefError {
    #[error("Empty channel reference")]
    Empty,

    #[error("Invalid channel reference: {0}")]
    Invalid(String),
}

/// A channel the user must have joined, as given in `FORCE_LINK`.
///
/// Accepts `@name`, `name`, `t.me/name`, `https://t.me/name` and numeric
/// chat ids such as `-1001234567890`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// Public channel or group addressed by username (without `@`).
    Username(String),

    /// Chat addressed by its numeric id.
    Id(i64),
}

impl ChannelRef {
    /// Parses a single channel reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference is empty or not a valid username.
    pub fn parse(raw: &str) -> Result<Self, ChannelRefError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ChannelRefError::Empty);
        }

        if let Ok(id) = raw.parse::<i64>() {
            return Ok(Self::Id(id));
        }

        let name = raw
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("t.me/")
            .trim_start_matches("telegram.me/")
            .trim_start_matches('@')
            .trim_end_matches('/');

        let valid = name.len() >= 4
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());

        if valid {
            Ok(Self::Username(name.to_owned()))
        } else {
            Err(ChannelRefError::Invalid(raw.to_owned()))
        }
    }

    /// Parses a comma or whitespace separated list of channel references.
    ///
    /// # Errors
    ///
    /// Returns the first invalid entry.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, ChannelRefError> {
        raw.split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .collect()
    }

    /// Public join link, if the channel has a username.
    #[must_use]
    pub fn join_url(&self) -> Option<String> {
        match self {
            Self::Username(name) => Some(format!("https://t.me/{name}")),
            Self::Id(_) => None,
        }
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username(name) => write!(f, "@{name}"),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_username_forms() {
        let expected = ChannelRef::Username("RoldexVerse".to_owned());
        assert_eq!(ChannelRef::parse("@RoldexVerse"), Ok(expected.clone()));
        assert_eq!(ChannelRef::parse("RoldexVerse"), Ok(expected.clone()));
        assert_eq!(ChannelRef::parse("t.me/RoldexVerse"), Ok(expected.clone()));
        assert_eq!(ChannelRef::parse("https://t.me/RoldexVerse/"), Ok(expected));
    }

    #[test]
    fn test_parse_numeric_id() {
        assert_eq!(
            ChannelRef::parse("-1001234567890"),
            Ok(ChannelRef::Id(-1_001_234_567_890))
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(ChannelRef::parse("  "), Err(ChannelRefError::Empty));
        assert!(ChannelRef::parse("@a b").is_err());
        assert!(ChannelRef::parse("@1abc").is_err());
    }

    #[test]
    fn test_parse_list() {
        let list = ChannelRef::parse_list("@RoldexVerse, @RoldexVerseChats").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].to_string(), "@RoldexVerseChats");
        assert!(ChannelRef::parse_list("").unwrap().is_empty());
    }

    #[test]
    fn test_join_url() {
        let channel = ChannelRef::Username("RoldexVerse".to_owned());
        assert_eq!(channel.join_url().as_deref(), Some("https://t.me/RoldexVerse"));
        assert_eq!(ChannelRef::Id(-100).join_url(), None);
    }
}
