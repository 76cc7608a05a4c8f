//! Wires the event bus to its subscribers (spec.md section 9, "Event
//! fan-out after write"): K (orchestrator) and M (cache manager)
//! dispatch as detached tasks, L (verifier) runs sequentially in the
//! loop since it must process one issue at a time (spec.md section 5,
//! "verifier runs sequentially per issue").

use std::sync::Arc;

use draw_contracts::PipelineEvent;
use draw_model::Draw;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::cache_manager::CacheManager;
use crate::events::EventBus;
use crate::prediction::{PredictionOrchestrator, PredictionVerifier};

pub struct Pipeline {
    pub events: EventBus,
    pub orchestrator: Arc<PredictionOrchestrator>,
    pub verifier: Arc<PredictionVerifier>,
    pub cache_manager: Arc<CacheManager>,
}

impl Pipeline {
    /// Spawns the subscriber loop and returns its handle so the server
    /// can join it during shutdown (spec.md section 9, "Global
    /// singletons": teardown closes pollers first, then releases
    /// sockets -- this loop is drained after the pollers stop
    /// publishing).
    pub fn spawn_subscribers(&self) -> JoinHandle<()> {
        let mut receiver = self.events.subscribe();
        let orchestrator = Arc::clone(&self.orchestrator);
        let verifier = Arc::clone(&self.verifier);
        let cache_manager = Arc::clone(&self.cache_manager);

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(PipelineEvent::DrawCommitted(draw)) => {
                        let draw: Arc<Draw> = Arc::from(draw);

                        orchestrator.dispatch(Arc::clone(&draw));

                        if let Err(e) = verifier.verify(&draw).await {
                            warn!(issue = %draw.issue, error = %e, "verifier failed");
                        }

                        let cache_manager = Arc::clone(&cache_manager);
                        tokio::spawn(async move { cache_manager.on_draw_committed().await });
                    }
                    Ok(PipelineEvent::PredictionCommitted { prediction_type, .. }) => {
                        let cache_manager = Arc::clone(&cache_manager);
                        tokio::spawn(async move {
                            cache_manager.on_prediction_committed(prediction_type).await
                        });
                    }
                    Ok(PipelineEvent::AllPredictionsCommitted { .. }) => {
                        let cache_manager = Arc::clone(&cache_manager);
                        tokio::spawn(async move { cache_manager.on_all_predictions_committed().await });
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event bus receiver lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
