use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ModelError, Result},
    ids::Issue,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionType {
    Parity,
    Magnitude,
    Combo,
    Kill,
}

impl PredictionType {
    pub const ALL: [PredictionType; 4] = [
        PredictionType::Parity,
        PredictionType::Magnitude,
        PredictionType::Combo,
        PredictionType::Kill,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            PredictionType::Parity => "parity",
            PredictionType::Magnitude => "magnitude",
            PredictionType::Combo => "combo",
            PredictionType::Kill => "kill",
        }
    }
}

const COMBO_LABELS: [&str; 4] = ["大单", "小单", "大双", "小双"];

/// Validates `predicted_value` against the type-specific grammar from
/// spec.md section 3. Whitespace around the value is tolerated; the
/// grammar itself is not.
pub fn validate_predicted_value(
    kind: PredictionType,
    value: &str,
) -> Result<String> {
    let trimmed = value.trim();
    let ok = match kind {
        PredictionType::Parity => trimmed == "单" || trimmed == "双",
        PredictionType::Magnitude => trimmed == "大" || trimmed == "小",
        PredictionType::Kill => COMBO_LABELS.contains(&trimmed),
        PredictionType::Combo => {
            let labels: Vec<&str> = trimmed.split(',').map(|s| s.trim()).collect();
            labels.len() == 2
                && labels[0] != labels[1]
                && labels.iter().all(|l| COMBO_LABELS.contains(l))
        }
    };
    if ok {
        Ok(trimmed.to_string())
    } else {
        Err(ModelError::InvalidPredictedValue(value.to_string(), kind))
    }
}

/// Ternary hit outcome; unresolved predictions stay `Unknown` until the
/// target draw's issue is committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitStatus {
    Unknown,
    Hit,
    Miss,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub issue: Issue,
    pub prediction_type: PredictionType,
    pub predicted_value: String,
    pub actual_numbers: Option<String>,
    pub actual_sum: Option<u8>,
    pub actual_value: Option<String>,
    pub hit: HitStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prediction {
    pub fn new_unresolved(
        issue: Issue,
        prediction_type: PredictionType,
        predicted_value: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            issue,
            prediction_type,
            predicted_value,
            actual_numbers: None,
            actual_sum: None,
            actual_value: None,
            hit: HitStatus::Unknown,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Derives the ground-truth label for a resolved draw, per spec.md
/// section 4.9 step 2: parity from parity-of-sum; magnitude from
/// sum>=14; combo/kill from both.
pub fn ground_truth_label(kind: PredictionType, sum: u8) -> String {
    let parity = if sum % 2 == 0 { "双" } else { "单" };
    let magnitude = if sum >= 14 { "大" } else { "小" };
    match kind {
        PredictionType::Parity => parity.to_string(),
        PredictionType::Magnitude => magnitude.to_string(),
        PredictionType::Combo | PredictionType::Kill => {
            format!("{magnitude}{parity}")
        }
    }
}

/// Deterministic hit computation from spec.md section 4.9 step 3. The
/// `kill` convention is inverted relative to the others by design; see
/// DESIGN.md for the resolved open question.
pub fn compute_hit(
    kind: PredictionType,
    predicted_value: &str,
    ground_truth: &str,
) -> HitStatus {
    match kind {
        PredictionType::Parity | PredictionType::Magnitude => {
            if predicted_value == ground_truth {
                HitStatus::Hit
            } else {
                HitStatus::Miss
            }
        }
        PredictionType::Combo => {
            let labels: Vec<&str> = predicted_value.split(',').map(|s| s.trim()).collect();
            if labels.iter().any(|l| *l == ground_truth) {
                HitStatus::Hit
            } else {
                HitStatus::Miss
            }
        }
        PredictionType::Kill => {
            if predicted_value != ground_truth {
                HitStatus::Hit
            } else {
                HitStatus::Miss
            }
        }
    }
}

/// Aggregate accuracy over the most recent 100 resolved predictions of a
/// type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitRateSnapshot {
    pub prediction_type: PredictionType,
    pub total: u32,
    pub hits: u32,
    pub misses: u32,
    pub rate: f64,
}

impl HitRateSnapshot {
    pub fn from_outcomes(prediction_type: PredictionType, outcomes: &[HitStatus]) -> Self {
        let hits = outcomes.iter().filter(|h| **h == HitStatus::Hit).count() as u32;
        let misses = outcomes.iter().filter(|h| **h == HitStatus::Miss).count() as u32;
        let total = hits + misses;
        let rate = if total == 0 { 0.0 } else { hits as f64 / total as f64 };
        Self {
            prediction_type,
            total,
            hits,
            misses,
            rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combo_hit_matches_either_label() {
        // predicted 大单,小双 ; ground truth 大单
        let gt = ground_truth_label(PredictionType::Combo, 19);
        assert_eq!(gt, "大单");
        assert_eq!(
            compute_hit(PredictionType::Combo, "大单,小双", &gt),
            HitStatus::Hit
        );
    }

    #[test]
    fn kill_hit_is_inverted() {
        let gt = ground_truth_label(PredictionType::Kill, 19);
        assert_eq!(gt, "大单");
        assert_eq!(compute_hit(PredictionType::Kill, "大单", &gt), HitStatus::Miss);
        assert_eq!(compute_hit(PredictionType::Kill, "小双", &gt), HitStatus::Hit);
    }

    #[test]
    fn validates_combo_grammar() {
        assert!(validate_predicted_value(PredictionType::Combo, "大单,小双").is_ok());
        assert!(validate_predicted_value(PredictionType::Combo, "大单,大单").is_err());
        assert!(validate_predicted_value(PredictionType::Combo, "大单").is_err());
    }
}
