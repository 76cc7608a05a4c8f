use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use draw_model::Category;

use crate::error::Result;

/// Owns the 49-entry omission (miss-streak) counter table.
#[async_trait]
pub trait OmissionStore: Send + Sync {
    async fn is_initialized(&self) -> Result<bool>;

    /// One-time bootstrap write (spec.md section 4.6 step 1); replaces
    /// whatever is currently stored.
    async fn initialize(&self, counters: HashMap<Category, u32>) -> Result<()>;

    async fn snapshot(&self) -> Result<HashMap<Category, u32>>;

    /// Applies one committed draw: categories in `held` reset to 0,
    /// every other category increments by one, as a single batched
    /// statement (spec.md section 4.6 steps 3-4).
    async fn apply(&self, held: &[Category]) -> Result<()>;
}

/// Owns the `(date, category) -> count` daily statistics table.
#[async_trait]
pub trait DailyStatsStore: Send + Sync {
    async fn increment(&self, date: NaiveDate, held: &[Category]) -> Result<()>;

    async fn snapshot(&self, date: NaiveDate) -> Result<HashMap<Category, u32>>;

    /// Clears all counters for a date ahead of a manual rebuild.
    async fn truncate(&self, date: NaiveDate) -> Result<()>;
}
