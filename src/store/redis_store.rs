//! Redis-backed session store.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tracing::{debug, info, warn};

use crate::config::SESSION_TTL_SECS;

use super::{
    ActivationCommit, PendingToken, SessionStore, StoreError, active_key, check_key, token_key,
};

/// Consumes a token and creates a session in one server-side step.
///
/// KEYS[1] = token key, KEYS[2] = session key
/// ARGV[1] = user id, ARGV[2] = activation timestamp, ARGV[3] = session TTL
const ACTIVATE_SCRIPT: &str = r"
local value = redis.call('GET', KEYS[1])
if not value then
    return 0
end
local sep = string.find(value, '|', 1, true)
if not sep or string.sub(value, 1, sep - 1) ~= ARGV[1] then
    return 2
end
if redis.call('EXISTS', KEYS[2]) == 1 then
    return 3
end
redis.call('DEL', KEYS[1])
redis.call('SET', KEYS[2], ARGV[2], 'EX', ARGV[3])
return 1
";

/// Number of keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 200;

/// Session store backed by a Redis server.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    activate_script: Script,
}

impl RedisSessionStore {
    /// Connects to the Redis server at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server is unreachable.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        info!("Connecting to session store...");

        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        info!("Connected to session store");

        Ok(Self {
            conn,
            activate_script: Script::new(ACTIVATE_SCRIPT),
        })
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn session_ttl(&self, user_id: u64) -> Result<Option<u64>, StoreError> {
        let mut conn = self.conn.clone();
        let key = active_key(user_id);
        let ttl: i64 = conn.ttl(&key).await?;

        match KeyTtl::from_reply(ttl) {
            KeyTtl::Missing => Ok(None),
            KeyTtl::Expires(secs) => Ok(Some(secs)),
            KeyTtl::Persistent => {
                warn!("Session key {} has no expiry, restoring the session TTL", key);
                let secs = i64::try_from(SESSION_TTL_SECS).unwrap_or(i64::MAX);
                let _: bool = conn.expire(&key, secs).await?;
                Ok(Some(SESSION_TTL_SECS))
            }
        }
    }

    async fn put_pending(&self, token: &PendingToken, ttl_secs: u64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let () = conn
            .set_ex(token_key(&token.id), token.encode_value(), ttl_secs)
            .await?;
        Ok(())
    }

    async fn pending(&self, token_id: &str) -> Result<Option<PendingToken>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(token_key(token_id)).await?;

        Ok(value.and_then(|value| {
            let token = PendingToken::decode(token_id, &value);
            if token.is_none() {
                warn!("Malformed pending token record: {}", token_id);
            }
            token
        }))
    }

    async fn activate(
        &self,
        token_id: &str,
        user_id: u64,
        activated_at: i64,
        ttl_secs: u64,
    ) -> Result<ActivationCommit, StoreError> {
        let mut conn = self.conn.clone();
        let code: i64 = self
            .activate_script
            .key(token_key(token_id))
            .key(active_key(user_id))
            .arg(user_id)
            .arg(activated_at)
            .arg(ttl_secs)
            .invoke_async(&mut conn)
            .await?;

        match code {
            0 => Ok(ActivationCommit::TokenMissing),
            1 => Ok(ActivationCommit::Activated),
            2 => Ok(ActivationCommit::ForeignToken),
            3 => Ok(ActivationCommit::AlreadyActive),
            other => Err(StoreError::UnexpectedReply(format!(
                "activation script returned {other}"
            ))),
        }
    }

    async fn remove_marker(&self, id: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(check_key(id)).await?;
        Ok(removed > 0)
    }

    async fn purge(&self, pattern: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let count: u64 = conn.del(&keys).await?;
                removed += count;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("Purged {} keys matching {}", removed, pattern);
        Ok(removed)
    }
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore").finish_non_exhaustive()
    }
}

/// Interpretation of a Redis `TTL` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyTtl {
    Missing,
    Persistent,
    Expires(u64),
}

impl KeyTtl {
    fn from_reply(ttl: i64) -> Self {
        match ttl {
            -1 => Self::Persistent,
            n => u64::try_from(n).map_or(Self::Missing, Self::Expires),
        }
    }
}
