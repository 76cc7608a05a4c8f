use async_trait::async_trait;
use draw_model::{HitStatus, Issue, Prediction, PredictionType};

use crate::error::Result;

/// Owns the `predictions` table keyed by `(issue, type)`.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn upsert(&self, prediction: &Prediction) -> Result<()>;

    async fn get(&self, issue: &Issue, kind: PredictionType) -> Result<Option<Prediction>>;

    /// Updates the outcome fields of a prior prediction (spec.md section
    /// 4.9 step 4).
    async fn record_outcome(
        &self,
        issue: &Issue,
        kind: PredictionType,
        actual_numbers: String,
        actual_sum: u8,
        actual_value: String,
        hit: HitStatus,
    ) -> Result<()>;

    /// Predicted values only, most recent first, for bias detection
    /// (spec.md section 4.8 step 2-3).
    async fn recent_values(&self, kind: PredictionType, limit: u32) -> Result<Vec<String>>;

    /// Hit outcomes of the most recent resolved predictions of a type,
    /// most recent first, for the hit-rate snapshot (spec.md section
    /// 4.9, last paragraph).
    async fn recent_resolved(&self, kind: PredictionType, limit: u32) -> Result<Vec<HitStatus>>;
}
