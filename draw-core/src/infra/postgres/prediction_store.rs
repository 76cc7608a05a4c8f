//! Postgres-backed `PredictionStore` (spec.md section 6.3: `predictions`
//! PK `(issue, type)`, secondary `(type, issue desc)`, secondary
//! `(type, hit, issue desc)`).

use async_trait::async_trait;
use chrono::Utc;
use draw_contracts::{ContractError, PredictionStore, Result};
use draw_model::{HitStatus, Issue, Prediction, PredictionType};
use sqlx::{PgPool, Row};

pub struct PostgresPredictionStore {
    pool: PgPool,
}

impl PostgresPredictionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> ContractError {
    ContractError::Backend(e.to_string())
}

fn hit_to_str(hit: HitStatus) -> &'static str {
    match hit {
        HitStatus::Unknown => "unknown",
        HitStatus::Hit => "hit",
        HitStatus::Miss => "miss",
    }
}

fn hit_from_str(s: &str) -> HitStatus {
    match s {
        "hit" => HitStatus::Hit,
        "miss" => HitStatus::Miss,
        _ => HitStatus::Unknown,
    }
}

#[async_trait]
impl PredictionStore for PostgresPredictionStore {
    async fn upsert(&self, prediction: &Prediction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO predictions (issue, type, predicted_value, hit, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (issue, type) DO UPDATE SET
                predicted_value = EXCLUDED.predicted_value,
                hit = EXCLUDED.hit,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(prediction.issue.as_str())
        .bind(prediction.prediction_type.key())
        .bind(&prediction.predicted_value)
        .bind(hit_to_str(prediction.hit))
        .bind(prediction.created_at)
        .bind(prediction.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get(&self, issue: &Issue, kind: PredictionType) -> Result<Option<Prediction>> {
        let row = sqlx::query("SELECT * FROM predictions WHERE issue = $1 AND type = $2")
            .bind(issue.as_str())
            .bind(kind.key())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        let Some(row) = row else { return Ok(None) };
        let issue: String = row.try_get("issue").map_err(db_err)?;
        Ok(Some(Prediction {
            issue: Issue::parse(issue).map_err(|e| ContractError::Serialization(e.to_string()))?,
            prediction_type: kind,
            predicted_value: row.try_get("predicted_value").map_err(db_err)?,
            actual_numbers: row.try_get("actual_numbers").map_err(db_err)?,
            actual_sum: row.try_get::<Option<i16>, _>("actual_sum").map_err(db_err)?.map(|n| n as u8),
            actual_value: row.try_get("actual_value").map_err(db_err)?,
            hit: hit_from_str(&row.try_get::<String, _>("hit").map_err(db_err)?),
            created_at: row.try_get("created_at").map_err(db_err)?,
            updated_at: row.try_get("updated_at").map_err(db_err)?,
        }))
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
        sqlx::query(
            r#"
            UPDATE predictions
            SET actual_numbers = $1, actual_sum = $2, actual_value = $3, hit = $4, updated_at = $5
            WHERE issue = $6 AND type = $7
            "#,
        )
        .bind(actual_numbers)
        .bind(actual_sum as i16)
        .bind(actual_value)
        .bind(hit_to_str(hit))
        .bind(Utc::now())
        .bind(issue.as_str())
        .bind(kind.key())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn recent_values(&self, kind: PredictionType, limit: u32) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT predicted_value FROM predictions WHERE type = $1 ORDER BY issue DESC LIMIT $2",
        )
        .bind(kind.key())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter()
            .map(|r| r.try_get("predicted_value").map_err(db_err))
            .collect()
    }

    async fn recent_resolved(&self, kind: PredictionType, limit: u32) -> Result<Vec<HitStatus>> {
        let rows = sqlx::query(
            "SELECT hit FROM predictions WHERE type = $1 AND hit != 'unknown' ORDER BY issue DESC LIMIT $2",
        )
        .bind(kind.key())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.into_iter()
            .map(|r| r.try_get::<String, _>("hit").map(|s| hit_from_str(&s)).map_err(db_err))
            .collect()
    }
}
