//! Channel membership check.

use async_trait::async_trait;

/// Decides whether a user has joined every required channel.
///
/// Implementations must fail closed: a lookup that cannot be completed
/// counts as "not a member".
#[async_trait]
pub trait MembershipGate: Send + Sync {
    /// Returns `true` if the user is a member of all required channels.
    async fn is_member(&self, user_id: u64) -> bool;
}
