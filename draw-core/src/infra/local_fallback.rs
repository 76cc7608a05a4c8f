//! Local fallbacks (spec.md section 5, "Local fallbacks" and section 9,
//! "Fallback caches as a degradation mode"): when Redis is unhealthy,
//! the dedup store degrades to a bounded, file-persisted in-memory map
//! and the lock service degrades to a plain local mutex map. Both are
//! best-effort -- reconciliation happens because the database upsert
//! is idempotent on the issue, so transient duplicate admission during
//! an outage is acceptable.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

const MAX_ENTRIES: usize = 5_000;
const ENTRY_TTL: Duration = Duration::from_secs(3_600);
const PERSIST_EVERY_INSERTS: u64 = 100;
const PERSIST_EVERY: Duration = Duration::from_secs(300);

#[derive(Serialize, Deserialize, Default)]
struct PersistedDedup {
    seen: Vec<(String, u64)>,
    last_issue: Option<String>,
}

/// Bounded, file-backed seen-set plus last-issue pointer used when the
/// distributed dedup store is unreachable.
pub struct LocalDedupFallback {
    seen: Mutex<HashMap<String, Instant>>,
    last_issue: Mutex<Option<String>>,
    path: Option<PathBuf>,
    inserts_since_persist: AtomicU64,
    last_persisted: Mutex<Instant>,
}

impl LocalDedupFallback {
    pub fn new(path: Option<PathBuf>) -> Self {
        let mut seen = HashMap::new();
        let mut last_issue = None;
        if let Some(p) = &path {
            if let Ok(bytes) = std::fs::read(p) {
                if let Ok(persisted) = serde_json::from_slice::<PersistedDedup>(&bytes) {
                    let now = Instant::now();
                    for (issue, age_secs) in persisted.seen {
                        let elapsed = Duration::from_secs(age_secs);
                        if elapsed < ENTRY_TTL {
                            seen.insert(issue, now - elapsed);
                        }
                    }
                    last_issue = persisted.last_issue;
                }
            }
        }
        Self {
            seen: Mutex::new(seen),
            last_issue: Mutex::new(last_issue),
            path,
            inserts_since_persist: AtomicU64::new(0),
            last_persisted: Mutex::new(Instant::now()),
        }
    }

    pub async fn is_seen(&self, issue: &str) -> bool {
        let mut seen = self.seen.lock().await;
        match seen.get(issue) {
            Some(inserted_at) if inserted_at.elapsed() < ENTRY_TTL => true,
            Some(_) => {
                seen.remove(issue);
                false
            }
            None => false,
        }
    }

    pub async fn mark_seen(&self, issue: &str) {
        {
            let mut seen = self.seen.lock().await;
            if seen.len() >= MAX_ENTRIES {
                if let Some(oldest) = seen.iter().min_by_key(|(_, t)| **t).map(|(k, _)| k.clone()) {
                    seen.remove(&oldest);
                }
            }
            seen.insert(issue.to_string(), Instant::now());
        }
        self.maybe_persist().await;
    }

    pub async fn last_issue(&self) -> Option<String> {
        self.last_issue.lock().await.clone()
    }

    pub async fn set_last_issue(&self, issue: &str) {
        *self.last_issue.lock().await = Some(issue.to_string());
        self.maybe_persist().await;
    }

    async fn maybe_persist(&self) {
        let Some(path) = &self.path else { return };
        let inserts = self.inserts_since_persist.fetch_add(1, Ordering::Relaxed) + 1;
        let elapsed_enough = {
            let last = self.last_persisted.lock().await;
            last.elapsed() >= PERSIST_EVERY
        };
        if inserts < PERSIST_EVERY_INSERTS && !elapsed_enough {
            return;
        }

        let seen = self.seen.lock().await;
        let now = Instant::now();
        let persisted = PersistedDedup {
            seen: seen
                .iter()
                .map(|(k, t)| (k.clone(), now.duration_since(*t).as_secs()))
                .collect(),
            last_issue: self.last_issue.lock().await.clone(),
        };
        drop(seen);

        match serde_json::to_vec(&persisted) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(path, bytes) {
                    warn!(error = %e, "failed to persist local dedup fallback");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize local dedup fallback"),
        }
        self.inserts_since_persist.store(0, Ordering::Relaxed);
        *self.last_persisted.lock().await = Instant::now();
    }
}

/// Local mutex-map fallback for the lock service. Not persisted --
/// locks are inherently ephemeral and a restart simply forgets them.
pub struct LocalLockFallback {
    entries: Mutex<HashMap<String, (String, Instant, Duration)>>,
}

impl LocalLockFallback {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn try_acquire(&self, key: &str, ttl: Duration) -> Option<String> {
        let mut entries = self.entries.lock().await;
        if let Some((_, acquired_at, held_ttl)) = entries.get(key) {
            if acquired_at.elapsed() < *held_ttl {
                return None;
            }
        }
        let token = uuid::Uuid::new_v4().to_string();
        entries.insert(key.to_string(), (token.clone(), Instant::now(), ttl));
        Some(token)
    }

    pub async fn release(&self, key: &str, token: &str) {
        let mut entries = self.entries.lock().await;
        if let Some((held_token, _, _)) = entries.get(key) {
            if held_token == token {
                entries.remove(key);
            }
        }
    }
}

impl Default for LocalLockFallback {
    fn default() -> Self {
        Self::new()
    }
}
