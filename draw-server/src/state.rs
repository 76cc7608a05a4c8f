use std::sync::Arc;

use draw_contracts::{CacheStore, DailyStatsStore, DrawStore, OmissionStore, PredictionStore};
use sqlx::PgPool;

/// Shared handles the minimal read API needs (spec.md "Minimal Read
/// API"); ingestion and prediction wiring live entirely in `main`'s
/// background tasks and never touch this state.
#[derive(Clone)]
pub struct AppState {
    pub draws: Arc<dyn DrawStore>,
    pub omission: Arc<dyn OmissionStore>,
    pub daily_stats: Arc<dyn DailyStatsStore>,
    pub predictions: Arc<dyn PredictionStore>,
    pub cache: Arc<dyn CacheStore>,
    pub health_pool: PgPool,
}
