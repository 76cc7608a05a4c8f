//! # Draw Server
//!
//! Process entrypoint for the real-time draw ingestion, dedup,
//! enrichment, statistics, and prediction pipeline.
//!
//! ## Architecture
//!
//! - PostgreSQL for durable storage (draws, omission counters, daily
//!   stats, predictions), pooled separately for reads and writes
//! - Redis for the distributed dedup/lock/cache tier, degrading to
//!   bounded local fallbacks when unhealthy
//! - One `HttpSourcePoller` per configured upstream source, each on its
//!   own clamped polling interval
//! - A typed event bus fanning committed draws out to the prediction
//!   orchestrator, verifier, and cache manager

pub mod errors;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use draw_config::{Args, Config};
use draw_contracts::{CacheStore, DedupStore, DrawStore, LockService, SourcePoll};
use draw_core::infra::llm::HttpLlmClient;
use draw_core::infra::local_fallback::{LocalDedupFallback, LocalLockFallback};
use draw_core::infra::postgres::{
    daily_stats_store::PostgresDailyStatsStore, draw_store::PostgresDrawStore,
    omission_store::PostgresOmissionStore, prediction_store::PostgresPredictionStore,
    HealthMonitor, PostgresPools,
};
use draw_core::infra::redis::{RedisCacheStore, RedisClient, RedisDedupStore, RedisLockService};
use draw_core::{
    CacheManager, DailyStatsEngine, EventBus, HttpSourcePoller, IngestCoordinator, IssueTracker,
    OmissionEngine, Pipeline, PredictionOrchestrator, PredictionVerifier, Writer,
};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "draw_server=debug,draw_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = args.apply(Config::from_env()?);
    info!(port = config.server_port, "configuration loaded");

    let pools = PostgresPools::connect(&config.database_url).await?;
    HealthMonitor::new(pools.clone()).spawn();
    info!("postgres pools connected, health monitor running");

    let redis_client = RedisClient::connect(&config.redis_url).await?;
    info!("redis connection established");

    let draw_store = Arc::new(PostgresDrawStore::new(pools.read.clone(), pools.write.clone()));
    let omission_store = Arc::new(PostgresOmissionStore::new(pools.write.clone()));
    let daily_stats_store = Arc::new(PostgresDailyStatsStore::new(pools.write.clone()));
    let prediction_store = Arc::new(PostgresPredictionStore::new(pools.write.clone()));

    let cache_store: Arc<dyn CacheStore> = Arc::new(RedisCacheStore::new(redis_client.clone()));
    let dedup_store: Arc<dyn DedupStore> = Arc::new(RedisDedupStore::new(
        redis_client.clone(),
        LocalDedupFallback::new(Some(config_fallback_path("dedup"))),
    ));
    let lock_service: Arc<dyn LockService> =
        Arc::new(RedisLockService::new(redis_client.clone(), LocalLockFallback::new()));

    let max_issue = draw_store.max_issue().await;
    if let Err(e) = &max_issue {
        warn!(error = %e, "issue tracker startup query failed, degrading to unready");
    } else {
        info!(?max_issue, "issue tracker seeded");
    }
    let tracker = Arc::new(IssueTracker::seed_or_degrade(max_issue));

    let llm = Arc::new(HttpLlmClient::new(
        config.llm_endpoint.clone(),
        config.llm_api_key.clone(),
        config.retry,
    ));

    let writer = Writer::new(draw_store.clone(), config.retry);
    let omission = OmissionEngine::new(
        omission_store.clone(),
        draw_store.clone(),
        config.omission_bootstrap_cap,
        config.omission_bootstrap_page_size,
    );
    let daily_stats = DailyStatsEngine::new(daily_stats_store.clone(), cache_store.clone(), draw_store.clone());

    let events = EventBus::new();
    let coordinator = Arc::new(IngestCoordinator::new(
        tracker,
        dedup_store,
        lock_service.clone(),
        writer,
        omission,
        daily_stats,
        events.clone(),
        config.cache_ttl.lock_issue,
        config.cache_ttl.seen_issue,
    ));

    let verifier = Arc::new(PredictionVerifier::new(
        prediction_store.clone(),
        cache_store.clone(),
        config.cache_ttl.winrate,
    ));
    let orchestrator = Arc::new(PredictionOrchestrator::new(
        draw_store.clone(),
        prediction_store.clone(),
        lock_service,
        llm,
        config.retry,
        events.clone(),
        config.cache_ttl.prediction_lock,
    ));
    let cache_manager = Arc::new(CacheManager::new(cache_store.clone(), verifier.clone()));

    let pipeline = Pipeline {
        events,
        orchestrator,
        verifier,
        cache_manager,
    };
    let pipeline_handle = pipeline.spawn_subscribers();

    let mut poller_handles = Vec::new();
    for source in &config.sources {
        let poller = HttpSourcePoller::new(source.clone());
        let coordinator = coordinator.clone();
        let interval_ms = source.clamped_interval_ms();
        let source_name = source.name.clone();

        poller_handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
            loop {
                interval.tick().await;
                match poller.poll_once().await {
                    Ok(Some(raw)) => {
                        if let Err(e) = coordinator.ingest(raw).await {
                            warn!(source = %source_name, error = %e, "ingest failed");
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(source = %source_name, error = %e, "poll failed"),
                }
            }
        }));
    }
    info!(count = poller_handles.len(), "source pollers started");

    let app_state = AppState {
        draws: draw_store,
        omission: omission_store,
        daily_stats: daily_stats_store,
        predictions: prediction_store,
        cache: cache_store,
        health_pool: pools.read.clone(),
    };

    let app = routes::create_router(app_state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.server_port));
    info!(%addr, "starting read API");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!(error = %e, "read API server error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    for handle in poller_handles {
        handle.abort();
    }
    pipeline_handle.abort();

    Ok(())
}

fn config_fallback_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("draw-server-{name}-fallback.json"))
}
