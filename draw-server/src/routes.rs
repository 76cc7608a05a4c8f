//! The minimal read API (spec.md "Minimal Read API"): existing only so
//! the cache manager's invalidation contract has a concrete surface to
//! invalidate. Route design and paging beyond `limit` are out of scope.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use draw_model::{HitRateSnapshot, PredictionType};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/draws/latest", get(latest_draws))
        .route("/api/omission", get(omission_snapshot))
        .route("/api/daily", get(daily_snapshot))
        .route("/api/predictions/{kind}", get(predictions_for_type))
        .route("/api/winrate/{kind}", get(winrate_for_type))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn parse_prediction_type(raw: &str) -> Option<PredictionType> {
    PredictionType::ALL.into_iter().find(|k| k.key() == raw)
}

async fn health(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let healthy = tokio::time::timeout(
        Duration::from_secs(5),
        sqlx::query("SELECT 1").execute(&state.health_pool),
    )
    .await
    .map(|r| r.is_ok())
    .unwrap_or(false);

    if healthy {
        Ok(Json(json!({ "status": "ok" })))
    } else {
        Err(AppError::internal("database unreachable"))
    }
}

#[derive(Deserialize)]
struct LatestQuery {
    limit: Option<u32>,
}

async fn latest_draws(
    State(state): State<AppState>,
    Query(q): Query<LatestQuery>,
) -> AppResult<Json<Value>> {
    let limit = q.limit.unwrap_or(20).clamp(1, 500);
    let draws = state.draws.latest(limit).await?;
    Ok(Json(json!({ "draws": draws })))
}

async fn omission_snapshot(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let counters = state.omission.snapshot().await?;
    let by_key: std::collections::HashMap<String, u32> =
        counters.into_iter().map(|(c, n)| (c.key(), n)).collect();
    Ok(Json(json!({ "omission": by_key })))
}

#[derive(Deserialize)]
struct DailyQuery {
    date: Option<NaiveDate>,
}

async fn daily_snapshot(
    State(state): State<AppState>,
    Query(q): Query<DailyQuery>,
) -> AppResult<Json<Value>> {
    let date = q.date.unwrap_or_else(|| draw_core::time::local_date(chrono::Utc::now()));
    let counters = state.daily_stats.snapshot(date).await?;
    let by_key: std::collections::HashMap<String, u32> =
        counters.into_iter().map(|(c, n)| (c.key(), n)).collect();
    Ok(Json(json!({ "date": date.to_string(), "daily": by_key })))
}

async fn predictions_for_type(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> AppResult<Json<Value>> {
    let kind = parse_prediction_type(&kind)
        .ok_or_else(|| AppError::bad_request(format!("unknown prediction type: {kind}")))?;
    let values = state.predictions.recent_values(kind, 20).await?;
    Ok(Json(json!({ "prediction_type": kind.key(), "recent": values })))
}

async fn winrate_for_type(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> AppResult<Json<Value>> {
    let kind = parse_prediction_type(&kind)
        .ok_or_else(|| AppError::bad_request(format!("unknown prediction type: {kind}")))?;

    let cache_key = format!("project:winrate:{}", kind.key());
    if let Some(bytes) = state.cache.get(&cache_key).await? {
        if let Ok(snapshot) = serde_json::from_slice::<HitRateSnapshot>(&bytes) {
            return Ok(Json(json!(snapshot)));
        }
    }

    let outcomes = state.predictions.recent_resolved(kind, 100).await?;
    Ok(Json(json!(HitRateSnapshot::from_outcomes(kind, &outcomes))))
}
