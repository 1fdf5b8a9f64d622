use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};

use super::store::{CounterStore, StoreError};
use crate::error::AppError;

// INCR and the first-hit PEXPIRE run as one script so no instance can observe
// a counter without a TTL.
const INCREMENT_SCRIPT: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
";

/// Counter store shared by every gateway instance pointed at the same Redis.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: ConnectionManager,
    script: Script,
}

impl RedisCounterStore {
    pub async fn connect(redis_url: &str) -> Result<Self, AppError> {
        let client = Client::open(redis_url)
            .map_err(|err| AppError::config(format!("Invalid REDIS_URL: {err}")))?;

        let conn = ConnectionManager::new(client).await.map_err(|err| {
            AppError::config(format!(
                "Unable to initialize Redis connection manager: {err}"
            ))
        })?;

        Ok(Self {
            conn,
            script: Script::new(INCREMENT_SCRIPT),
        })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let window_ms = window.as_millis().max(1) as u64;

        self.script
            .key(key)
            .arg(window_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }
}
