//! Writer (spec.md section 4.4, component H): the retry-wrapped,
//! idempotent upsert into the draw store. Unique-violation is already
//! converted to `UpsertOutcome::AlreadyPresent` by the concrete
//! `DrawStore` implementation (see `infra::postgres::draw_store`); this
//! layer only retries the transient cases (spec.md section 7).

use std::sync::Arc;

use draw_config::RetryConfig;
use draw_contracts::{ContractError, DrawStore, UpsertOutcome};
use draw_model::Draw;

use crate::error::Result;
use crate::retry::with_retry;

pub struct Writer {
    store: Arc<dyn DrawStore>,
    retry: RetryConfig,
}

impl Writer {
    pub fn new(store: Arc<dyn DrawStore>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    pub async fn write(&self, draw: &Draw) -> Result<UpsertOutcome> {
        let outcome = with_retry(
            self.retry.base,
            self.retry.ceiling,
            self.retry.max_attempts,
            |e: &ContractError| matches!(e, ContractError::Unavailable(_) | ContractError::Timeout(_)),
            || self.store.upsert(draw),
        )
        .await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use draw_contracts::Result as ContractResult;
    use draw_model::{Issue, NumberTriple, RawDraw};

    use super::*;
    use crate::test_support::FakeDrawStore;

    /// Fails the first `fail_count` upserts with a transient error,
    /// then delegates to a `FakeDrawStore`.
    struct FlakyDrawStore {
        remaining_failures: AtomicU32,
        inner: FakeDrawStore,
    }

    #[async_trait]
    impl DrawStore for FlakyDrawStore {
        async fn upsert(&self, draw: &Draw) -> ContractResult<UpsertOutcome> {
            if self.remaining_failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n > 0 {
                    Some(n - 1)
                } else {
                    None
                }
            }).is_ok() {
                return Err(ContractError::Unavailable("connection reset".into()));
            }
            self.inner.upsert(draw).await
        }

        async fn max_issue(&self) -> ContractResult<Option<Issue>> {
            self.inner.max_issue().await
        }

        async fn latest(&self, limit: u32) -> ContractResult<Vec<Draw>> {
            self.inner.latest(limit).await
        }

        async fn page_newest_first(&self, offset: u32, limit: u32) -> ContractResult<Vec<Draw>> {
            self.inner.page_newest_first(offset, limit).await
        }

        async fn day_oldest_first(&self, date: chrono::NaiveDate) -> ContractResult<Vec<Draw>> {
            self.inner.day_oldest_first(date).await
        }
    }

    fn draw(issue: &str) -> Draw {
        let t = NumberTriple::parse_canonical("3+5+8").unwrap();
        let raw = RawDraw {
            issue: Issue::parse(issue).unwrap(),
            open_time: Utc::now(),
            open_nums: "3+5+8".to_string(),
            sum: t.sum(),
            source: "S1".to_string(),
        };
        crate::enrich::enrich(raw, t)
    }

    #[tokio::test]
    async fn writes_through_on_the_first_try() {
        let store = Arc::new(FakeDrawStore::default());
        let writer = Writer::new(store.clone(), RetryConfig::default());

        let outcome = writer.write(&draw("2024001")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
    }

    #[tokio::test]
    async fn retries_a_transient_failure_until_it_succeeds() {
        let store = Arc::new(FlakyDrawStore {
            remaining_failures: AtomicU32::new(2),
            inner: FakeDrawStore::default(),
        });
        let writer = Writer::new(store, RetryConfig {
            base: std::time::Duration::from_millis(1),
            ceiling: std::time::Duration::from_millis(5),
            max_attempts: 5,
        });

        let outcome = writer.write(&draw("2024002")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
    }

    #[tokio::test]
    async fn reingesting_the_same_issue_is_folded_into_already_present() {
        let store = Arc::new(FakeDrawStore::default());
        let writer = Writer::new(store, RetryConfig::default());

        writer.write(&draw("2024003")).await.unwrap();
        let outcome = writer.write(&draw("2024003")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::AlreadyPresent);
    }
}
