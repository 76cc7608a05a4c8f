//! Daily Stats Engine (spec.md section 4.7, component J): per-day
//! per-category hit counts, guarded by a cache-backed per-issue
//! idempotency marker.

use std::sync::Arc;

use chrono::NaiveDate;
use draw_contracts::{CacheStore, DailyStatsStore, DrawStore};
use draw_model::{Draw, Issue};
use tracing::warn;

use crate::error::Result;
use crate::time::{local_date, seconds_until_midnight};

fn marker_key(date: NaiveDate, issue: &Issue) -> String {
    format!("project:today_stats:processed:{date}:{issue}")
}

pub struct DailyStatsEngine {
    store: Arc<dyn DailyStatsStore>,
    cache: Arc<dyn CacheStore>,
    draws: Arc<dyn DrawStore>,
}

impl DailyStatsEngine {
    pub fn new(
        store: Arc<dyn DailyStatsStore>,
        cache: Arc<dyn CacheStore>,
        draws: Arc<dyn DrawStore>,
    ) -> Self {
        Self { store, cache, draws }
    }

    /// Applies one committed draw (spec.md section 4.7 steps 1-4). The
    /// idempotency marker is consulted first since the caller's own
    /// dedup funnel (A/B/C) only guarantees single application within
    /// one process lifetime, not across a cache-miss replay.
    pub async fn apply(&self, draw: &Draw) -> Result<()> {
        let date = local_date(draw.open_time);
        let key = marker_key(date, &draw.issue);

        if self.cache.get(&key).await?.is_some() {
            return Ok(());
        }

        let held = draw.held_categories();
        self.store.increment(date, &held).await?;

        let ttl = seconds_until_midnight(draw.open_time);
        self.cache.set(&key, b"1".to_vec(), Some(ttl)).await?;
        Ok(())
    }

    /// Rebuilds a date's counters from scratch: truncates, rescans all
    /// committed draws of that date oldest-to-newest, re-applies, and
    /// clears idempotency markers (spec.md section 4.7, last
    /// paragraph). Invoked manually, never from the commit path.
    pub async fn rebuild(&self, date: NaiveDate) -> Result<()> {
        self.store.truncate(date).await?;
        let draws = self.draws.day_oldest_first(date).await?;
        for draw in &draws {
            let held = draw.held_categories();
            if let Err(e) = self.store.increment(date, &held).await {
                warn!(issue = %draw.issue, error = %e, "rebuild increment failed");
            }
            let key = marker_key(date, &draw.issue);
            if let Err(e) = self.cache.delete(&key).await {
                warn!(issue = %draw.issue, error = %e, "failed to clear idempotency marker during rebuild");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use draw_model::{Category, Issue, NumberTriple, RawDraw};

    use super::*;
    use crate::test_support::{FakeCacheStore, FakeDailyStatsStore, FakeDrawStore};

    fn draw(issue: &str, nums: &str) -> Draw {
        let t = NumberTriple::parse_canonical(nums).unwrap();
        let raw = RawDraw {
            issue: Issue::parse(issue).unwrap(),
            open_time: Utc::now(),
            open_nums: nums.to_string(),
            sum: t.sum(),
            source: "S1".to_string(),
        };
        crate::enrich::enrich(raw, t)
    }

    #[tokio::test]
    async fn apply_increments_held_categories_once() {
        let store = Arc::new(FakeDailyStatsStore::default());
        let cache = Arc::new(FakeCacheStore::default());
        let draws = Arc::new(FakeDrawStore::default());
        let engine = DailyStatsEngine::new(store.clone(), cache, draws);

        let d = draw("2024001", "1+1+1");
        engine.apply(&d).await.unwrap();

        let date = local_date(d.open_time);
        let snapshot = store.snapshot(date).await.unwrap();
        for category in d.held_categories() {
            assert_eq!(snapshot.get(&category).copied().unwrap_or(0), 1);
        }
    }

    #[tokio::test]
    async fn apply_is_a_no_op_once_the_idempotency_marker_is_set() {
        let store = Arc::new(FakeDailyStatsStore::default());
        let cache = Arc::new(FakeCacheStore::default());
        let draws = Arc::new(FakeDrawStore::default());
        let engine = DailyStatsEngine::new(store.clone(), cache, draws);

        let d = draw("2024002", "2+2+2");
        engine.apply(&d).await.unwrap();
        engine.apply(&d).await.unwrap();

        let date = local_date(d.open_time);
        let snapshot = store.snapshot(date).await.unwrap();
        assert_eq!(snapshot.get(&Category::Triple).copied().unwrap_or(0), 1);
    }

    #[tokio::test]
    async fn rebuild_truncates_and_rescans_from_the_draw_store() {
        let store = Arc::new(FakeDailyStatsStore::default());
        let cache = Arc::new(FakeCacheStore::default());
        let d = draw("2024003", "1+1+1");
        let date = local_date(d.open_time);
        let draws = Arc::new(FakeDrawStore::seeded(vec![d.clone()]));

        let engine = DailyStatsEngine::new(store.clone(), cache, draws);
        store.increment(date, &[Category::Triple]).await.unwrap();
        store.increment(date, &[Category::Triple]).await.unwrap();

        engine.rebuild(date).await.unwrap();

        let snapshot = store.snapshot(date).await.unwrap();
        assert_eq!(snapshot.get(&Category::Triple).copied().unwrap_or(0), 1);
    }
}
