//! Postgres-backed `DrawStore` (spec.md section 6.3: PK `issue`, unique
//! index on `issue`, secondary index on `open_time desc`).
//!
//! Runtime-bound `sqlx::query`/`query_as` is used throughout instead of
//! the compile-time-checked `query!` macro: the latter needs a live
//! database (or a committed offline query cache) to verify against at
//! build time, which this workspace has neither of.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use draw_contracts::{ContractError, DrawStore, Result, UpsertOutcome};
use draw_model::{Combination, Draw, Issue};
use sqlx::{PgPool, Row};

use crate::retry::classify_sqlx;
use crate::time::source_offset;

pub struct PostgresDrawStore {
    read: PgPool,
    write: PgPool,
}

impl PostgresDrawStore {
    pub fn new(read: PgPool, write: PgPool) -> Self {
        Self { read, write }
    }
}

fn combination_to_str(c: Combination) -> &'static str {
    c.as_str()
}

fn combination_from_str(s: &str) -> Combination {
    match s {
        "big-odd" => Combination::BigOdd,
        "small-odd" => Combination::SmallOdd,
        "big-even" => Combination::BigEven,
        _ => Combination::SmallEven,
    }
}

fn row_to_draw(row: sqlx::postgres::PgRow) -> Result<Draw> {
    let issue: String = row.try_get("issue").map_err(db_err)?;
    Ok(Draw {
        issue: Issue::parse(issue).map_err(|e| ContractError::Serialization(e.to_string()))?,
        open_time: row.try_get("open_time").map_err(db_err)?,
        open_nums: row.try_get("open_nums").map_err(db_err)?,
        sum: row.try_get::<i16, _>("sum").map_err(db_err)? as u8,
        source: row.try_get("source").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
        is_big: row.try_get("is_big").map_err(db_err)?,
        is_small: row.try_get("is_small").map_err(db_err)?,
        is_odd: row.try_get("is_odd").map_err(db_err)?,
        is_even: row.try_get("is_even").map_err(db_err)?,
        is_extreme_big: row.try_get("is_extreme_big").map_err(db_err)?,
        is_extreme_small: row.try_get("is_extreme_small").map_err(db_err)?,
        combination: combination_from_str(&row.try_get::<String, _>("combination").map_err(db_err)?),
        is_triple: row.try_get("is_triple").map_err(db_err)?,
        is_pair: row.try_get("is_pair").map_err(db_err)?,
        is_straight: row.try_get("is_straight").map_err(db_err)?,
        is_misc: row.try_get("is_misc").map_err(db_err)?,
        is_small_edge: row.try_get("is_small_edge").map_err(db_err)?,
        is_middle: row.try_get("is_middle").map_err(db_err)?,
        is_big_edge: row.try_get("is_big_edge").map_err(db_err)?,
        is_edge: row.try_get("is_edge").map_err(db_err)?,
        is_dragon: row.try_get("is_dragon").map_err(db_err)?,
        is_tiger: row.try_get("is_tiger").map_err(db_err)?,
        is_tie: row.try_get("is_tie").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> ContractError {
    ContractError::Backend(e.to_string())
}

#[async_trait]
impl DrawStore for PostgresDrawStore {
    async fn upsert(&self, draw: &Draw) -> Result<UpsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO draws (
                issue, open_time, open_nums, sum, source, created_at, updated_at,
                is_big, is_small, is_odd, is_even, is_extreme_big, is_extreme_small,
                combination, is_triple, is_pair, is_straight, is_misc,
                is_small_edge, is_middle, is_big_edge, is_edge, is_dragon, is_tiger, is_tie
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25
            )
            ON CONFLICT (issue) DO NOTHING
            "#,
        )
        .bind(draw.issue.as_str())
        .bind(draw.open_time)
        .bind(&draw.open_nums)
        .bind(draw.sum as i16)
        .bind(&draw.source)
        .bind(draw.created_at)
        .bind(draw.updated_at)
        .bind(draw.is_big)
        .bind(draw.is_small)
        .bind(draw.is_odd)
        .bind(draw.is_even)
        .bind(draw.is_extreme_big)
        .bind(draw.is_extreme_small)
        .bind(combination_to_str(draw.combination))
        .bind(draw.is_triple)
        .bind(draw.is_pair)
        .bind(draw.is_straight)
        .bind(draw.is_misc)
        .bind(draw.is_small_edge)
        .bind(draw.is_middle)
        .bind(draw.is_big_edge)
        .bind(draw.is_edge)
        .bind(draw.is_dragon)
        .bind(draw.is_tiger)
        .bind(draw.is_tie)
        .execute(&self.write)
        .await;

        match result {
            Ok(r) if r.rows_affected() == 1 => Ok(UpsertOutcome::Inserted),
            Ok(_) => Ok(UpsertOutcome::AlreadyPresent),
            Err(sqlx::Error::Database(ref db_e)) if db_e.code().as_deref() == Some("23505") => {
                Ok(UpsertOutcome::AlreadyPresent)
            }
            Err(e) => match classify_sqlx(&e) {
                crate::retry::ErrorClass::TransientTransport => {
                    Err(ContractError::Unavailable(e.to_string()))
                }
                _ => Err(db_err(e)),
            },
        }
    }

    async fn max_issue(&self) -> Result<Option<Issue>> {
        let row = sqlx::query("SELECT issue FROM draws ORDER BY issue DESC LIMIT 1")
            .fetch_optional(&self.read)
            .await
            .map_err(db_err)?;
        match row {
            Some(r) => {
                let issue: String = r.try_get("issue").map_err(db_err)?;
                Ok(Some(
                    Issue::parse(issue).map_err(|e| ContractError::Serialization(e.to_string()))?,
                ))
            }
            None => Ok(None),
        }
    }

    async fn latest(&self, limit: u32) -> Result<Vec<Draw>> {
        let rows = sqlx::query("SELECT * FROM draws ORDER BY open_time DESC LIMIT $1")
            .bind(limit as i64)
            .fetch_all(&self.read)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(row_to_draw).collect()
    }

    async fn page_newest_first(&self, offset: u32, limit: u32) -> Result<Vec<Draw>> {
        let rows = sqlx::query("SELECT * FROM draws ORDER BY open_time DESC LIMIT $1 OFFSET $2")
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.read)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(row_to_draw).collect()
    }

    async fn day_oldest_first(&self, date: NaiveDate) -> Result<Vec<Draw>> {
        let offset = source_offset();
        let start: DateTime<Utc> = offset
            .from_local_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
            .single()
            .expect("midnight is unambiguous in a fixed offset")
            .with_timezone(&Utc);
        let end: DateTime<Utc> = offset
            .from_local_datetime(&(date + chrono::Duration::days(1)).and_hms_opt(0, 0, 0).unwrap())
            .single()
            .expect("midnight is unambiguous in a fixed offset")
            .with_timezone(&Utc);
        let rows = sqlx::query("SELECT * FROM draws WHERE open_time >= $1 AND open_time < $2 ORDER BY open_time ASC")
            .bind(start)
            .bind(end)
            .fetch_all(&self.read)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(row_to_draw).collect()
    }
}
