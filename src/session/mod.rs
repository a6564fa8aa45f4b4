//! Session lifecycle.
//!
//! A user requests a token, follows the verification link, and comes back
//! with `/start token_<uuid>`. The activator then checks membership,
//! validates the token and opens a session that expires on its own.
//!
//! ```text
//! NoToken ──/gen──▶ TokenPendingValidation ──/start token_──▶ Activated
//!                                                        └──▶ Rejected
//! ```

mod activator;
mod gate;
mod issuer;

pub use activator::{ActivationOutcome, SessionActivator};
pub use gate::MembershipGate;
pub use issuer::{IssueOutcome, TokenIssuer};

use thiserror::Error;

use crate::shortener::ShortenerError;
use crate::store::StoreError;

/// Errors surfaced while issuing or activating a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session store failure: {0}")]
    Store(#[from] StoreError),

    #[error("Could not create verification link: {0}")]
    Shortener(#[from] ShortenerError),
}

/// Renders a remaining lifetime in seconds for humans.
///
/// Shows at most two units and drops seconds once hours are involved.
#[must_use]
pub fn humanize_secs(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    let unit = |n: u64, name: &str| {
        if n == 1 {
            format!("1 {name}")
        } else {
            format!("{n} {name}s")
        }
    };

    match (hours, minutes, seconds) {
        (0, 0, s) => unit(s, "second"),
        (0, m, 0) => unit(m, "minute"),
        (0, m, s) => format!("{} {}", unit(m, "minute"), unit(s, "second")),
        (h, 0, _) => unit(h, "hour"),
        (h, m, _) => format!("{} {}", unit(h, "hour"), unit(m, "minute")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize_secs() {
        assert_eq!(humanize_secs(0), "0 seconds");
        assert_eq!(humanize_secs(1), "1 second");
        assert_eq!(humanize_secs(45), "45 seconds");
        assert_eq!(humanize_secs(60), "1 minute");
        assert_eq!(humanize_secs(3540), "59 minutes");
        assert_eq!(humanize_secs(3599), "59 minutes 59 seconds");
        assert_eq!(humanize_secs(3600), "1 hour");
        assert_eq!(humanize_secs(3661), "1 hour 1 minute");
        assert_eq!(humanize_secs(7325), "2 hours 2 minutes");
    }
}
