use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::Result;

const HEALTHY_INTERVAL: Duration = Duration::from_secs(30);
const UNHEALTHY_INTERVAL_BASE: Duration = Duration::from_secs(1);
const UNHEALTHY_INTERVAL_CEILING: Duration = Duration::from_secs(30);

/// Separately-pooled read and write connections (spec.md section 5:
/// "Database connections are pooled separately for reads and writes
/// with configured limits; the read pool is sized for orders of
/// magnitude more concurrency than the write pool").
#[derive(Clone)]
pub struct PostgresPools {
    pub read: PgPool,
    pub write: PgPool,
}

impl PostgresPools {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let read_max = std::env::var("DB_READ_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50u32);
        let write_max = std::env::var("DB_WRITE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5u32);

        let read = PgPoolOptions::new()
            .max_connections(read_max)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        let write = PgPoolOptions::new()
            .max_connections(write_max)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        info!(read_max, write_max, "postgres pools connected");
        Ok(Self { read, write })
    }
}

/// Adaptive-cadence health check (spec.md section 5): polls fast while
/// unhealthy, slow while healthy, with exponential backoff between
/// reconnection attempts.
pub struct HealthMonitor {
    pools: PostgresPools,
}

impl HealthMonitor {
    pub fn new(pools: PostgresPools) -> Self {
        Self { pools }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(&self) {
        let mut healthy = true;
        let mut backoff = UNHEALTHY_INTERVAL_BASE;
        loop {
            let ok = sqlx::query("SELECT 1").execute(&self.pools.read).await.is_ok();
            if ok {
                if !healthy {
                    info!("postgres read pool recovered");
                }
                healthy = true;
                backoff = UNHEALTHY_INTERVAL_BASE;
                tokio::time::sleep(HEALTHY_INTERVAL).await;
            } else {
                if healthy {
                    warn!("postgres read pool health check failed");
                }
                healthy = false;
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(UNHEALTHY_INTERVAL_CEILING);
            }
        }
    }
}
