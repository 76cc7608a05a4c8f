//! Postgres-backed `DailyStatsStore` (spec.md section 6.3: `daily_stats`
//! PK `(date, category)`).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use draw_contracts::{ContractError, DailyStatsStore, Result};
use draw_model::Category;
use sqlx::{PgPool, Row};

pub struct PostgresDailyStatsStore {
    pool: PgPool,
}

impl PostgresDailyStatsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> ContractError {
    ContractError::Backend(e.to_string())
}

#[async_trait]
impl DailyStatsStore for PostgresDailyStatsStore {
    async fn increment(&self, date: NaiveDate, held: &[Category]) -> Result<()> {
        let keys: Vec<String> = held.iter().map(|c| c.key()).collect();
        sqlx::query(
            r#"
            INSERT INTO daily_stats (date, category, count)
            SELECT $1, k, 1 FROM UNNEST($2::text[]) AS k
            ON CONFLICT (date, category) DO UPDATE SET count = daily_stats.count + 1
            "#,
        )
        .bind(date)
        .bind(&keys)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn snapshot(&self, date: NaiveDate) -> Result<HashMap<Category, u32>> {
        let rows = sqlx::query("SELECT category, count FROM daily_stats WHERE date = $1")
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let key: String = row.try_get("category").map_err(db_err)?;
            let count: i64 = row.try_get("count").map_err(db_err)?;
            if let Some(category) = Category::from_key(&key) {
                out.insert(category, count as u32);
            }
        }
        Ok(out)
    }

    async fn truncate(&self, date: NaiveDate) -> Result<()> {
        sqlx::query("DELETE FROM daily_stats WHERE date = $1")
            .bind(date)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
