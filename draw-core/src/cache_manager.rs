//! Cache Manager (spec.md section 4.11, component M): post-write
//! invalidation of dependent cache keys, subscribed to `draw-committed`
//! and `prediction-committed`.

use std::sync::Arc;

use draw_contracts::CacheStore;
use draw_model::PredictionType;
use tracing::warn;

use crate::prediction::PredictionVerifier;

const DRAW_COMMIT_PATTERNS: &[&str] = &[
    "project:kj:limit:*",
    "project:yl*",
    "project:yk*",
    "project:excel:lottery:*",
    "project:excel:stats:*",
];

pub struct CacheManager {
    cache: Arc<dyn CacheStore>,
    verifier: Arc<PredictionVerifier>,
}

impl CacheManager {
    pub fn new(cache: Arc<dyn CacheStore>, verifier: Arc<PredictionVerifier>) -> Self {
        Self { cache, verifier }
    }

    /// Invalidates the draw-dependent key classes in parallel,
    /// isolating failures per key class (spec.md section 4.11).
    /// Prediction caches are deliberately untouched here -- the new
    /// predictions have not been written yet.
    pub async fn on_draw_committed(&self) {
        let futures = DRAW_COMMIT_PATTERNS
            .iter()
            .map(|pattern| self.cache.scan_delete(pattern));
        for (pattern, result) in DRAW_COMMIT_PATTERNS.iter().zip(futures::future::join_all(futures).await) {
            if let Err(e) = result {
                warn!(pattern, error = %e, "cache invalidation failed");
            }
        }
    }

    pub async fn on_prediction_committed(&self, kind: PredictionType) {
        let pattern = format!("project:predict:{}:limit:*", kind.key());
        if let Err(e) = self.cache.scan_delete(&pattern).await {
            warn!(pattern = %pattern, error = %e, "prediction cache invalidation failed");
        }
    }

    pub async fn on_all_predictions_committed(&self) {
        if let Err(e) = self.verifier.refresh_hit_rates().await {
            warn!(error = %e, "hit-rate snapshot refresh failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use draw_contracts::CacheStore;

    use super::*;
    use crate::test_support::{FakeCacheStore, FakePredictionStore};

    #[tokio::test]
    async fn on_draw_committed_clears_every_pattern_class() {
        let cache = Arc::new(FakeCacheStore::default());
        cache.set("project:kj:limit:10", b"x".to_vec(), None).await.unwrap();
        cache.set("project:yl:home", b"x".to_vec(), None).await.unwrap();
        cache.set("project:excel:stats:today", b"x".to_vec(), None).await.unwrap();
        cache.set("project:unrelated:key", b"keep".to_vec(), None).await.unwrap();

        let verifier = Arc::new(PredictionVerifier::new(
            Arc::new(FakePredictionStore::default()),
            cache.clone(),
            std::time::Duration::from_secs(300),
        ));
        let manager = CacheManager::new(cache.clone(), verifier);
        manager.on_draw_committed().await;

        assert!(cache.get("project:kj:limit:10").await.unwrap().is_none());
        assert!(cache.get("project:yl:home").await.unwrap().is_none());
        assert!(cache.get("project:excel:stats:today").await.unwrap().is_none());
        assert_eq!(cache.get("project:unrelated:key").await.unwrap(), Some(b"keep".to_vec()));
    }

    #[tokio::test]
    async fn on_prediction_committed_only_clears_that_types_keys() {
        let cache = Arc::new(FakeCacheStore::default());
        cache.set("project:predict:parity:limit:5", b"x".to_vec(), None).await.unwrap();
        cache.set("project:predict:magnitude:limit:5", b"x".to_vec(), None).await.unwrap();

        let verifier = Arc::new(PredictionVerifier::new(
            Arc::new(FakePredictionStore::default()),
            cache.clone(),
            std::time::Duration::from_secs(300),
        ));
        let manager = CacheManager::new(cache.clone(), verifier);
        manager.on_prediction_committed(PredictionType::Parity).await;

        assert!(cache.get("project:predict:parity:limit:5").await.unwrap().is_none());
        assert!(cache.get("project:predict:magnitude:limit:5").await.unwrap().is_some());
    }
}
