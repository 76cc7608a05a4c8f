//! Redis-backed `CacheStore` (component D, spec.md section 4.10):
//! get/set/delete plus pattern-scan invalidation using a non-blocking
//! cursor and batches of up to 1000 keys.

use std::time::Duration;

use async_trait::async_trait;
use draw_contracts::{CacheStore, ContractError, Result};
use redis::AsyncCommands;

use super::RedisClient;

const SCAN_BATCH: u64 = 1_000;

pub struct RedisCacheStore {
    client: RedisClient,
}

impl RedisCacheStore {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

fn redis_err(e: redis::RedisError) -> ContractError {
    ContractError::Backend(e.to_string())
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.client.connection();
        conn.get(key).await.map_err(redis_err)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.client.connection();
        match ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl.as_secs())
                .await
                .map_err(redis_err),
            None => conn.set::<_, _, ()>(key, value).await.map_err(redis_err),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.client.connection();
        conn.del::<_, ()>(key).await.map_err(redis_err)
    }

    async fn scan_delete(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.client.connection();
        let mut cursor: u64 = 0;
        let mut deleted = 0u64;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(redis_err)?;

            if !keys.is_empty() {
                for chunk in keys.chunks(SCAN_BATCH as usize) {
                    let n: u64 = conn.del(chunk).await.map_err(redis_err)?;
                    deleted += n;
                }
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(deleted)
    }
}
