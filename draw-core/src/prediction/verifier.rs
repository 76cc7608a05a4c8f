//! Prediction Verifier (spec.md section 4.9, component L): resolves
//! prior predictions targeting a just-committed issue and recomputes
//! hit-rate snapshots once every type for that issue has settled.

use std::sync::Arc;
use std::time::Duration;

use draw_contracts::{CacheStore, PredictionStore};
use draw_model::{compute_hit, ground_truth_label, Draw, HitRateSnapshot, PredictionType};
use tracing::{info, warn};

use crate::error::Result;

const HIT_RATE_WINDOW: u32 = 100;

pub struct PredictionVerifier {
    predictions: Arc<dyn PredictionStore>,
    cache: Arc<dyn CacheStore>,
    winrate_ttl: Duration,
}

impl PredictionVerifier {
    pub fn new(predictions: Arc<dyn PredictionStore>, cache: Arc<dyn CacheStore>, winrate_ttl: Duration) -> Self {
        Self {
            predictions,
            cache,
            winrate_ttl,
        }
    }

    /// Resolves the four prediction types targeting `draw.issue`
    /// (spec.md section 4.9 steps 1-4) and emits one audit line
    /// summarizing the per-draw hit ratio (step 5).
    pub async fn verify(&self, draw: &Draw) -> Result<()> {
        let mut resolved = 0u32;
        let mut hits = 0u32;

        for kind in PredictionType::ALL {
            let Some(prior) = self.predictions.get(&draw.issue, kind).await? else {
                continue;
            };

            let ground_truth = ground_truth_label(kind, draw.sum);
            let hit = compute_hit(kind, &prior.predicted_value, &ground_truth);

            self.predictions
                .record_outcome(
                    &draw.issue,
                    kind,
                    draw.open_nums.clone(),
                    draw.sum,
                    ground_truth,
                    hit,
                )
                .await?;

            resolved += 1;
            if hit == draw_model::HitStatus::Hit {
                hits += 1;
            }
        }

        if resolved > 0 {
            info!(issue = %draw.issue, resolved, hits, "prediction audit");
        }
        Ok(())
    }

    /// Recomputes and caches the hit-rate snapshot for every type
    /// (spec.md section 4.9, last paragraph), invoked after
    /// `all-predictions-committed`.
    pub async fn refresh_hit_rates(&self) -> Result<()> {
        for kind in PredictionType::ALL {
            let outcomes = self.predictions.recent_resolved(kind, HIT_RATE_WINDOW).await?;
            let snapshot = HitRateSnapshot::from_outcomes(kind, &outcomes);
            let key = format!("project:winrate:{}", kind.key());
            let payload = serde_json::to_vec(&snapshot).map_err(crate::error::PipelineError::from)?;
            if let Err(e) = self.cache.set(&key, payload, Some(self.winrate_ttl)).await {
                warn!(kind = kind.key(), error = %e, "failed to cache hit-rate snapshot");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use draw_model::{Issue, NumberTriple, Prediction, RawDraw};

    use super::*;
    use crate::test_support::{FakeCacheStore, FakePredictionStore};

    fn committed_draw(issue: &str, nums: &str) -> Draw {
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
    async fn verify_resolves_a_matching_prediction_as_a_hit() {
        let predictions = Arc::new(FakePredictionStore::default());
        let cache = Arc::new(FakeCacheStore::default());
        let d = committed_draw("2024001", "9+9+1"); // sum 19 -> 大单

        predictions.insert(Prediction::new_unresolved(
            d.issue.clone(),
            PredictionType::Parity,
            "单".to_string(),
            Utc::now(),
        ));

        let verifier = PredictionVerifier::new(predictions.clone(), cache, Duration::from_secs(300));
        verifier.verify(&d).await.unwrap();

        let resolved = predictions.get(&d.issue, PredictionType::Parity).await.unwrap().unwrap();
        assert_eq!(resolved.hit, draw_model::HitStatus::Hit);
        assert_eq!(resolved.actual_value.as_deref(), Some("单"));
    }

    #[tokio::test]
    async fn verify_is_a_no_op_when_nothing_targets_the_issue() {
        let predictions = Arc::new(FakePredictionStore::default());
        let cache = Arc::new(FakeCacheStore::default());
        let d = committed_draw("2024002", "1+1+1");

        let verifier = PredictionVerifier::new(predictions, cache, Duration::from_secs(300));
        verifier.verify(&d).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_hit_rates_caches_a_snapshot_per_type() {
        let predictions = Arc::new(FakePredictionStore::default());
        let cache = Arc::new(FakeCacheStore::default());

        let mut hit = Prediction::new_unresolved(
            Issue::parse("2024001").unwrap(),
            PredictionType::Parity,
            "单".to_string(),
            Utc::now(),
        );
        hit.hit = draw_model::HitStatus::Hit;
        predictions.insert(hit);

        let verifier = PredictionVerifier::new(predictions, cache.clone(), Duration::from_secs(300));
        verifier.refresh_hit_rates().await.unwrap();

        let payload = cache.get("project:winrate:parity").await.unwrap().unwrap();
        let snapshot: HitRateSnapshot = serde_json::from_slice(&payload).unwrap();
        assert_eq!(snapshot.total, 1);
        assert_eq!(snapshot.hits, 1);
    }
}
