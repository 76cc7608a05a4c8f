//! Postgres-backed `OmissionStore` (spec.md section 6.3: `omission_counters`
//! PK `category`). `apply` issues a single batched `CASE`-expression
//! update per commit (spec.md section 4.6 step 4) to minimize round trips.

use std::collections::HashMap;

use async_trait::async_trait;
use draw_contracts::{ContractError, OmissionStore, Result};
use draw_model::Category;
use sqlx::{PgPool, Row};

pub struct PostgresOmissionStore {
    pool: PgPool,
}

impl PostgresOmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> ContractError {
    ContractError::Backend(e.to_string())
}

#[async_trait]
impl OmissionStore for PostgresOmissionStore {
    async fn is_initialized(&self) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM omission_counters")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        let n: i64 = row.try_get("n").map_err(db_err)?;
        Ok(n > 0)
    }

    async fn initialize(&self, counters: HashMap<Category, u32>) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query("TRUNCATE omission_counters")
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        for (category, count) in &counters {
            sqlx::query(
                "INSERT INTO omission_counters (category, count) VALUES ($1, $2)
                 ON CONFLICT (category) DO UPDATE SET count = EXCLUDED.count",
            )
            .bind(category.key())
            .bind(*count as i64)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn snapshot(&self) -> Result<HashMap<Category, u32>> {
        let rows = sqlx::query("SELECT category, count FROM omission_counters")
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

    async fn apply(&self, held: &[Category]) -> Result<()> {
        let held_keys: Vec<String> = held.iter().map(|c| c.key()).collect();
        sqlx::query(
            r#"
            UPDATE omission_counters
            SET count = CASE WHEN category = ANY($1) THEN 0 ELSE count + 1 END
            "#,
        )
        .bind(&held_keys)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
