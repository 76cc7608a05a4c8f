//! Redis-backed `DedupStore` (component B, spec.md section 4.3/5),
//! degrading to a bounded local fallback when Redis returns an error.

use std::time::Duration;

use async_trait::async_trait;
use draw_contracts::{DedupStore, Result};
use draw_model::Issue;
use redis::AsyncCommands;
use tracing::warn;

use crate::infra::local_fallback::LocalDedupFallback;

use super::RedisClient;

const SEEN_KEY_PREFIX: &str = "project:seen:issue:";
const LAST_ISSUE_KEY: &str = "project:last:issue";

pub struct RedisDedupStore {
    client: RedisClient,
    fallback: LocalDedupFallback,
}

impl RedisDedupStore {
    pub fn new(client: RedisClient, fallback: LocalDedupFallback) -> Self {
        Self { client, fallback }
    }

    fn seen_key(issue: &Issue) -> String {
        format!("{SEEN_KEY_PREFIX}{}", issue.as_str())
    }
}

#[async_trait]
impl DedupStore for RedisDedupStore {
    async fn is_seen(&self, issue: &Issue) -> Result<bool> {
        let mut conn = self.client.connection();
        match conn.exists(Self::seen_key(issue)).await {
            Ok(seen) => Ok(seen),
            Err(e) => {
                warn!(error = %e, "redis is_seen failed, using local fallback");
                Ok(self.fallback.is_seen(issue.as_str()).await)
            }
        }
    }

    async fn mark_seen(&self, issue: &Issue, ttl: Duration) -> Result<()> {
        let mut conn = self.client.connection();
        let res: redis::RedisResult<()> =
            conn.set_ex(Self::seen_key(issue), 1, ttl.as_secs()).await;
        if let Err(e) = res {
            warn!(error = %e, "redis mark_seen failed, using local fallback");
        }
        self.fallback.mark_seen(issue.as_str()).await;
        Ok(())
    }

    async fn last_issue(&self) -> Result<Option<Issue>> {
        let mut conn = self.client.connection();
        match conn.get::<_, Option<String>>(LAST_ISSUE_KEY).await {
            Ok(Some(s)) => Ok(Issue::parse(s).ok()),
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(error = %e, "redis last_issue failed, using local fallback");
                Ok(self.fallback.last_issue().await.and_then(|s| Issue::parse(s).ok()))
            }
        }
    }

    async fn set_last_issue(&self, issue: &Issue) -> Result<()> {
        let mut conn = self.client.connection();
        let res: redis::RedisResult<()> = conn.set(LAST_ISSUE_KEY, issue.as_str()).await;
        if let Err(e) = res {
            warn!(error = %e, "redis set_last_issue failed, using local fallback");
        }
        self.fallback.set_last_issue(issue.as_str()).await;
        Ok(())
    }
}
