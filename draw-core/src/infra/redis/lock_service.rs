//! Redis-backed `LockService` (component C, spec.md section 4.4 step 3/9):
//! `SET key token NX PX ttl` to acquire, a token-checked Lua `DEL` to
//! release so a lock re-acquired by someone else after TTL expiry is
//! never stolen back. Degrades to a local mutex map when Redis errors.

use std::time::Duration;

use async_trait::async_trait;
use draw_contracts::{LockHandle, LockService, Result};
use tracing::warn;

use crate::infra::local_fallback::LocalLockFallback;

use super::RedisClient;

// Only deletes the key if its current value still matches the token we
// were handed, so a stale release can't clobber a fresh acquisition.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

pub struct RedisLockService {
    client: RedisClient,
    fallback: LocalLockFallback,
}

impl RedisLockService {
    pub fn new(client: RedisClient, fallback: LocalLockFallback) -> Self {
        Self { client, fallback }
    }
}

#[async_trait]
impl LockService for RedisLockService {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockHandle>> {
        let token = uuid::Uuid::new_v4().to_string();
        let mut conn = self.client.connection();

        let set: redis::RedisResult<Option<String>> = redis::cmd("SET")
            .arg(key)
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await;

        match set {
            Ok(Some(_)) => Ok(Some(LockHandle {
                key: key.to_string(),
                token,
            })),
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(error = %e, "redis try_acquire failed, using local fallback");
                Ok(self
                    .fallback
                    .try_acquire(key, ttl)
                    .await
                    .map(|token| LockHandle {
                        key: key.to_string(),
                        token,
                    }))
            }
        }
    }

    async fn release(&self, handle: &LockHandle) -> Result<()> {
        let mut conn = self.client.connection();
        let script = redis::Script::new(RELEASE_SCRIPT);
        let res: redis::RedisResult<i64> = script
            .key(&handle.key)
            .arg(&handle.token)
            .invoke_async(&mut conn)
            .await;

        if let Err(e) = res {
            warn!(error = %e, "redis release failed, using local fallback");
        }
        self.fallback.release(&handle.key, &handle.token).await;
        Ok(())
    }
}
