use async_trait::async_trait;
use chrono::NaiveDate;
use draw_model::{Draw, Issue};

use crate::error::Result;

/// Outcome of an upsert attempt, distinguishing a fresh commit from the
/// idempotent no-op described in spec.md section 4.4 step 4: a unique
/// constraint violation on `issue` is treated as a successful duplicate,
/// never surfaced as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    AlreadyPresent,
}

/// Owns the authoritative `draws` table (component H's target, spec.md
/// section 6.3).
#[async_trait]
pub trait DrawStore: Send + Sync {
    async fn upsert(&self, draw: &Draw) -> Result<UpsertOutcome>;

    /// Highest committed issue, used by the Issue Tracker's `initialize`.
    async fn max_issue(&self) -> Result<Option<Issue>>;

    /// Most recent `limit` committed draws, newest first.
    async fn latest(&self, limit: u32) -> Result<Vec<Draw>>;

    /// Newest-first page used by the omission bootstrap scan (spec.md
    /// section 4.6 step 1).
    async fn page_newest_first(&self, offset: u32, limit: u32) -> Result<Vec<Draw>>;

    /// All draws of a given wall-clock day, oldest first, used by the
    /// daily-stats rebuild (spec.md section 4.7).
    async fn day_oldest_first(&self, date: NaiveDate) -> Result<Vec<Draw>>;
}
