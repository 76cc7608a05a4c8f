use draw_model::{Draw, Issue, PredictionType};

/// The three event contracts exposed to subscribers (spec.md section
/// 6.4). These are the only coupling points between the ingestion path
/// and the omission/daily-stats/prediction/cache subsystems.
#[derive(Clone, Debug)]
pub enum PipelineEvent {
    DrawCommitted(Box<Draw>),
    PredictionCommitted {
        issue: Issue,
        prediction_type: PredictionType,
        value: String,
        duration_ms: u64,
    },
    AllPredictionsCommitted {
        issue: Issue,
    },
}
