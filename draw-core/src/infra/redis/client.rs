use draw_contracts::{ContractError, Result};
use redis::aio::ConnectionManager;
use tracing::info;

/// Thin wrapper around a `ConnectionManager`, which is itself cheaply
/// cloneable and handles its own reconnection; every `CacheStore` /
/// `DedupStore` / `LockService` implementation clones it per call.
#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
}

impl RedisClient {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        info!("connecting to redis");
        let client = redis::Client::open(redis_url)
            .map_err(|e| ContractError::Unavailable(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| ContractError::Unavailable(format!("redis connect failed: {e}")))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}
