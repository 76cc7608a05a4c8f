use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Keyed cache for API read payloads (component D). Deletion by pattern
/// must use non-blocking cursor iteration and batch deletes of up to
/// 1000 keys (spec.md section 4.10); implementations report how many
/// keys were removed so callers can log invalidation breadth.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn scan_delete(&self, pattern: &str) -> Result<u64>;
}
