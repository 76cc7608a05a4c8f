use std::time::Duration;

use async_trait::async_trait;
use draw_model::Issue;

use crate::error::Result;

/// Distributed seen-set plus last-issue pointer (component B). Backed by
/// Redis in production with a bounded file-persisted local fallback when
/// Redis is unhealthy (spec.md section 5, "Local fallbacks").
#[async_trait]
pub trait DedupStore: Send + Sync {
    async fn is_seen(&self, issue: &Issue) -> Result<bool>;

    async fn mark_seen(&self, issue: &Issue, ttl: Duration) -> Result<()>;

    async fn last_issue(&self) -> Result<Option<Issue>>;

    async fn set_last_issue(&self, issue: &Issue) -> Result<()>;
}

/// An acquired per-issue lock. Dropping without calling `release`
/// leaves the lock to expire on its own TTL; callers should always call
/// `release` explicitly once their critical section is done (spec.md
/// section 4.4 step 9), matching the teacher's lease-handle pattern
/// rather than relying on `Drop` for an async release.
#[derive(Debug, Clone)]
pub struct LockHandle {
    pub key: String,
    pub token: String,
}

/// Distributed per-issue mutex with TTL (component C), degrading to a
/// local mutex map when the distributed backend is unhealthy.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Attempts to acquire the lock for `key` without blocking. Returns
    /// `None` immediately if already held.
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<Option<LockHandle>>;

    async fn release(&self, handle: &LockHandle) -> Result<()>;
}
