//! In-memory fakes of the `draw-contracts` trait surface, used by unit
//! tests elsewhere in this crate (coordinator, omission, verifier,
//! cache manager). Not exported outside the crate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use draw_contracts::{
    CacheStore, DailyStatsStore, DedupStore, DrawStore, LockHandle, LockService, OmissionStore,
    PredictionStore, Result, UpsertOutcome,
};
use draw_model::{Category, Draw, HitStatus, Issue, Prediction, PredictionType};

#[derive(Default)]
pub struct FakeDrawStore {
    draws: Mutex<Vec<Draw>>,
}

impl FakeDrawStore {
    pub fn seeded(draws: Vec<Draw>) -> Self {
        Self {
            draws: Mutex::new(draws),
        }
    }
}

#[async_trait]
impl DrawStore for FakeDrawStore {
    async fn upsert(&self, draw: &Draw) -> Result<UpsertOutcome> {
        let mut draws = self.draws.lock().unwrap();
        if draws.iter().any(|d| d.issue == draw.issue) {
            return Ok(UpsertOutcome::AlreadyPresent);
        }
        draws.push(draw.clone());
        Ok(UpsertOutcome::Inserted)
    }

    async fn max_issue(&self) -> Result<Option<Issue>> {
        Ok(self.draws.lock().unwrap().iter().map(|d| d.issue.clone()).max())
    }

    async fn latest(&self, limit: u32) -> Result<Vec<Draw>> {
        let mut draws = self.draws.lock().unwrap().clone();
        draws.sort_by(|a, b| b.issue.cmp(&a.issue));
        draws.truncate(limit as usize);
        Ok(draws)
    }

    async fn page_newest_first(&self, offset: u32, limit: u32) -> Result<Vec<Draw>> {
        let mut draws = self.draws.lock().unwrap().clone();
        draws.sort_by(|a, b| b.issue.cmp(&a.issue));
        Ok(draws
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn day_oldest_first(&self, date: NaiveDate) -> Result<Vec<Draw>> {
        let mut draws: Vec<Draw> = self
            .draws
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.open_time.date_naive() == date)
            .cloned()
            .collect();
        draws.sort_by(|a, b| a.issue.cmp(&b.issue));
        Ok(draws)
    }
}

#[derive(Default)]
pub struct FakeOmissionStore {
    initialized: Mutex<bool>,
    counters: Mutex<HashMap<Category, u32>>,
}

#[async_trait]
impl OmissionStore for FakeOmissionStore {
    async fn is_initialized(&self) -> Result<bool> {
        Ok(*self.initialized.lock().unwrap())
    }

    async fn initialize(&self, counters: HashMap<Category, u32>) -> Result<()> {
        *self.counters.lock().unwrap() = counters;
        *self.initialized.lock().unwrap() = true;
        Ok(())
    }

    async fn snapshot(&self) -> Result<HashMap<Category, u32>> {
        Ok(self.counters.lock().unwrap().clone())
    }

    async fn apply(&self, held: &[Category]) -> Result<()> {
        let mut counters = self.counters.lock().unwrap();
        for (category, count) in counters.iter_mut() {
            if held.contains(category) {
                *count = 0;
            } else {
                *count += 1;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeDailyStatsStore {
    counters: Mutex<HashMap<(NaiveDate, Category), u32>>,
}

#[async_trait]
impl DailyStatsStore for FakeDailyStatsStore {
    async fn increment(&self, date: NaiveDate, held: &[Category]) -> Result<()> {
        let mut counters = self.counters.lock().unwrap();
        for category in held {
            *counters.entry((date, *category)).or_insert(0) += 1;
        }
        Ok(())
    }

    async fn snapshot(&self, date: NaiveDate) -> Result<HashMap<Category, u32>> {
        Ok(self
            .counters
            .lock()
            .unwrap()
            .iter()
            .filter(|((d, _), _)| *d == date)
            .map(|((_, c), n)| (*c, *n))
            .collect())
    }

    async fn truncate(&self, date: NaiveDate) -> Result<()> {
        self.counters.lock().unwrap().retain(|(d, _), _| *d != date);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeCacheStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl CacheStore for FakeCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>, _ttl: Option<Duration>) -> Result<()> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn scan_delete(&self, pattern: &str) -> Result<u64> {
        let prefix = pattern.trim_end_matches('*');
        let mut entries = self.entries.lock().unwrap();
        let matching: Vec<String> = entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        for key in &matching {
            entries.remove(key);
        }
        Ok(matching.len() as u64)
    }
}

#[derive(Default)]
pub struct FakeDedupStore {
    seen: Mutex<HashMap<String, ()>>,
    last_issue: Mutex<Option<Issue>>,
}

#[async_trait]
impl DedupStore for FakeDedupStore {
    async fn is_seen(&self, issue: &Issue) -> Result<bool> {
        Ok(self.seen.lock().unwrap().contains_key(issue.as_str()))
    }

    async fn mark_seen(&self, issue: &Issue, _ttl: Duration) -> Result<()> {
        self.seen.lock().unwrap().insert(issue.as_str().to_string(), ());
        Ok(())
    }

    async fn last_issue(&self) -> Result<Option<Issue>> {
        Ok(self.last_issue.lock().unwrap().clone())
    }

    async fn set_last_issue(&self, issue: &Issue) -> Result<()> {
        *self.last_issue.lock().unwrap() = Some(issue.clone());
        Ok(())
    }
}

/// Always grants the lock immediately and never fails -- the coordinator
/// tests below aren't exercising lock contention, only the 9-step
/// sequence around it.
#[derive(Default)]
pub struct FakeLockService;

#[async_trait]
impl LockService for FakeLockService {
    async fn try_acquire(&self, key: &str, _ttl: Duration) -> Result<Option<LockHandle>> {
        Ok(Some(LockHandle {
            key: key.to_string(),
            token: "fake-token".to_string(),
        }))
    }

    async fn release(&self, _handle: &LockHandle) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePredictionStore {
    rows: Mutex<HashMap<(Issue, PredictionType), Prediction>>,
}

impl FakePredictionStore {
    pub fn insert(&self, prediction: Prediction) {
        self.rows
            .lock()
            .unwrap()
            .insert((prediction.issue.clone(), prediction.prediction_type), prediction);
    }
}

#[async_trait]
impl PredictionStore for FakePredictionStore {
    async fn upsert(&self, prediction: &Prediction) -> Result<()> {
        self.insert(prediction.clone());
        Ok(())
    }

    async fn get(&self, issue: &Issue, kind: PredictionType) -> Result<Option<Prediction>> {
        Ok(self.rows.lock().unwrap().get(&(issue.clone(), kind)).cloned())
    }

    async fn record_outcome(
        &self,
        issue: &Issue,
        kind: PredictionType,
        actual_numbers: String,
        actual_sum: u8,
        actual_value: String,
        hit: HitStatus,
    ) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.get_mut(&(issue.clone(), kind)) {
            row.actual_numbers = Some(actual_numbers);
            row.actual_sum = Some(actual_sum);
            row.actual_value = Some(actual_value);
            row.hit = hit;
        }
        Ok(())
    }

    async fn recent_values(&self, kind: PredictionType, limit: u32) -> Result<Vec<String>> {
        let mut rows: Vec<Prediction> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.prediction_type == kind)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.issue.cmp(&a.issue));
        rows.truncate(limit as usize);
        Ok(rows.into_iter().map(|p| p.predicted_value).collect())
    }

    async fn recent_resolved(&self, kind: PredictionType, limit: u32) -> Result<Vec<HitStatus>> {
        let mut rows: Vec<Prediction> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.prediction_type == kind && p.hit != HitStatus::Unknown)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.issue.cmp(&a.issue));
        rows.truncate(limit as usize);
        Ok(rows.into_iter().map(|p| p.hit).collect())
    }
}
