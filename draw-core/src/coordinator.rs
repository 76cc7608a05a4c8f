//! Ingest Coordinator (spec.md section 4.4, component F): funnels one
//! raw draw through the Tracker/Dedup/Lock funnel, then validates,
//! enriches, writes, and fans out. Every step after the lock is
//! acquired runs inside a guard that releases the lock unconditionally
//! (step 9), even on a validation or write failure.

use std::sync::Arc;
use std::time::Duration;

use draw_contracts::{DedupStore, LockService, PipelineEvent};
use draw_model::RawDraw;
use tracing::{info, warn};

use crate::daily_stats::DailyStatsEngine;
use crate::error::Result;
use crate::events::EventBus;
use crate::omission::OmissionEngine;
use crate::tracker::IssueTracker;
use crate::validate::check_non_regression;
use crate::writer::Writer;

pub struct IngestCoordinator {
    tracker: Arc<IssueTracker>,
    dedup: Arc<dyn DedupStore>,
    lock: Arc<dyn LockService>,
    writer: Writer,
    omission: OmissionEngine,
    daily_stats: DailyStatsEngine,
    events: EventBus,
    lock_ttl: Duration,
    seen_ttl: Duration,
}

impl IngestCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tracker: Arc<IssueTracker>,
        dedup: Arc<dyn DedupStore>,
        lock: Arc<dyn LockService>,
        writer: Writer,
        omission: OmissionEngine,
        daily_stats: DailyStatsEngine,
        events: EventBus,
        lock_ttl: Duration,
        seen_ttl: Duration,
    ) -> Self {
        Self {
            tracker,
            dedup,
            lock,
            writer,
            omission,
            daily_stats,
            events,
            lock_ttl,
            seen_ttl,
        }
    }

    /// Runs the full 9-step sequence for one raw draw (spec.md section
    /// 4.4). Returns `Ok(())` for every silently-dropped outcome as
    /// well as a successful commit -- only a hard infrastructure error
    /// from a step that must not be swallowed propagates.
    pub async fn ingest(&self, raw: RawDraw) -> Result<()> {
        // 1. Tracker check.
        if self.tracker.is_stale(&raw.issue) {
            return Ok(());
        }

        // 2. Seen check.
        if self.dedup.is_seen(&raw.issue).await? {
            return Ok(());
        }

        // 3. Acquire lock, non-blocking.
        let lock_key = format!("project:lock:issue:{}", raw.issue);
        let Some(handle) = self.lock.try_acquire(&lock_key, self.lock_ttl).await? else {
            return Ok(());
        };

        let result = self.ingest_locked(raw).await;
        // 9. Release lock unconditionally.
        if let Err(e) = self.lock.release(&handle).await {
            warn!(error = %e, "failed to release issue lock");
        }
        result
    }

    async fn ingest_locked(&self, raw: RawDraw) -> Result<()> {
        // 4a. Re-check seen-set under lock.
        if self.dedup.is_seen(&raw.issue).await? {
            return Ok(());
        }

        // 4b. Validate: structural grammar/sum consistency, then
        // non-regression against the last-issue pointer.
        let triple = match raw.validate() {
            Ok(t) => t,
            Err(e) => {
                warn!(issue = %raw.issue, error = %e, "validation failed, dropping");
                return Ok(());
            }
        };
        let last_issue = self.dedup.last_issue().await?;
        check_non_regression(&raw.issue, last_issue.as_ref());

        // 4c. Enrich.
        let draw = crate::enrich::enrich(raw, triple);

        // 4d. Upsert (retry-wrapped; unique-violation already folded
        // into a successful no-op by the store).
        self.writer.write(&draw).await?;

        // 5. Omission + Daily Stats: logged and swallowed, never roll
        // back the commit.
        if let Err(e) = self.omission.apply(&draw).await {
            warn!(issue = %draw.issue, error = %e, "omission engine failed");
        }
        if let Err(e) = self.daily_stats.apply(&draw).await {
            warn!(issue = %draw.issue, error = %e, "daily stats engine failed");
        }

        // 6. Mark seen, publish last-issue pointer.
        self.dedup.mark_seen(&draw.issue, self.seen_ttl).await?;
        self.dedup.set_last_issue(&draw.issue).await?;

        // 7. Update Tracker.
        self.tracker.advance(&draw.issue);

        // 8. Emit draw-committed. Subscribers (L, K, M) run off the
        // bus; this call must not hold the lock (spec.md section 9),
        // which is satisfied since the lock is only released by the
        // caller after this function returns.
        info!(issue = %draw.issue, source = %draw.source, "draw committed");
        self.events.publish(PipelineEvent::DrawCommitted(Box::new(draw)));

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use draw_config::RetryConfig;
    use draw_contracts::DrawStore;
    use draw_model::RawDraw;

    use super::*;
    use crate::test_support::{
        FakeCacheStore, FakeDailyStatsStore, FakeDedupStore, FakeDrawStore, FakeLockService,
        FakeOmissionStore,
    };

    fn coordinator() -> (IngestCoordinator, Arc<FakeDrawStore>) {
        let draw_store = Arc::new(FakeDrawStore::default());
        let writer = Writer::new(draw_store.clone(), RetryConfig::default());
        let omission = OmissionEngine::new(
            Arc::new(FakeOmissionStore::default()),
            draw_store.clone(),
            10_000,
            500,
        );
        let daily_stats = DailyStatsEngine::new(
            Arc::new(FakeDailyStatsStore::default()),
            Arc::new(FakeCacheStore::default()),
            draw_store.clone(),
        );
        let coordinator = IngestCoordinator::new(
            Arc::new(IssueTracker::new()),
            Arc::new(FakeDedupStore::default()),
            Arc::new(FakeLockService),
            writer,
            omission,
            daily_stats,
            EventBus::new(),
            Duration::from_secs(3),
            Duration::from_secs(3_600),
        );
        (coordinator, draw_store)
    }

    fn raw(issue: &str) -> RawDraw {
        RawDraw {
            issue: draw_model::Issue::parse(issue).unwrap(),
            open_time: Utc::now(),
            open_nums: "3+5+8".to_string(),
            sum: 16,
            source: "S1".to_string(),
        }
    }

    #[tokio::test]
    async fn commits_a_fresh_draw_and_publishes_it() {
        let (coordinator, draw_store) = coordinator();
        let mut rx = coordinator.events.subscribe();

        coordinator.ingest(raw("2024001")).await.unwrap();

        let stored = draw_store.latest(10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].issue, draw_model::Issue::parse("2024001").unwrap());

        match rx.try_recv().unwrap() {
            PipelineEvent::DrawCommitted(d) => {
                assert_eq!(d.issue, draw_model::Issue::parse("2024001").unwrap())
            }
            other => panic!("expected DrawCommitted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_issue_is_dropped_without_writing() {
        let (coordinator, draw_store) = coordinator();
        coordinator.ingest(raw("2024005")).await.unwrap();
        coordinator.ingest(raw("2024001")).await.unwrap();

        let stored = draw_store.latest(10).await.unwrap();
        assert_eq!(stored.len(), 1, "older issue must not be re-committed");
    }

    #[tokio::test]
    async fn reingesting_the_same_issue_is_a_no_op() {
        let (coordinator, draw_store) = coordinator();
        coordinator.ingest(raw("2024001")).await.unwrap();
        coordinator.ingest(raw("2024001")).await.unwrap();

        let stored = draw_store.latest(10).await.unwrap();
        assert_eq!(stored.len(), 1);
    }
}
