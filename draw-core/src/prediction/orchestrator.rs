//! Prediction Orchestrator (spec.md section 4.8, component K): on every
//! committed draw, drives four independent prediction tasks for the
//! next issue behind a distributed prediction-lock.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use draw_config::RetryConfig;
use draw_contracts::{ContractError, DrawStore, LlmClient, LockService, PipelineEvent, PredictionStore};
use draw_model::{validate_predicted_value, Draw, Prediction, PredictionType};
use tracing::{info, warn};

use crate::error::Result;
use crate::events::EventBus;
use crate::retry::with_retry;

use super::prompt;

const LLM_DEADLINE: Duration = Duration::from_secs(20);
const RECENT_DRAWS: u32 = 50;
const RECENT_VALUES: u32 = 10;

pub struct PredictionOrchestrator {
    draws: Arc<dyn DrawStore>,
    predictions: Arc<dyn PredictionStore>,
    lock: Arc<dyn LockService>,
    llm: Arc<dyn LlmClient>,
    retry: RetryConfig,
    events: EventBus,
    prediction_lock_ttl: Duration,
}

impl PredictionOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        draws: Arc<dyn DrawStore>,
        predictions: Arc<dyn PredictionStore>,
        lock: Arc<dyn LockService>,
        llm: Arc<dyn LlmClient>,
        retry: RetryConfig,
        events: EventBus,
        prediction_lock_ttl: Duration,
    ) -> Self {
        Self {
            draws,
            predictions,
            lock,
            llm,
            retry,
            events,
            prediction_lock_ttl,
        }
    }

    /// Dispatches the prediction cycle for the issue following `draw`
    /// without blocking the caller (spec.md section 4.8, last
    /// paragraph: "MUST NOT block the draw-committed subscriber path").
    pub fn dispatch(self: &Arc<Self>, draw: Arc<Draw>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = this.run_for_issue(draw).await {
                warn!(error = %e, "prediction cycle failed");
            }
        });
    }

    async fn run_for_issue(&self, draw: Arc<Draw>) -> Result<()> {
        let next_issue = draw.issue.next();
        let lock_key = format!("project:predict:lock:{next_issue}");

        let Some(handle) = self.lock.try_acquire(&lock_key, self.prediction_lock_ttl).await? else {
            return Ok(());
        };

        let result = self.run_locked(next_issue.clone()).await;

        if let Err(e) = self.lock.release(&handle).await {
            warn!(error = %e, "failed to release prediction lock");
        }

        result?;

        self.events.publish(PipelineEvent::AllPredictionsCommitted {
            issue: next_issue,
        });
        Ok(())
    }

    /// Runs the four prediction tasks for `next_issue`. Always returns
    /// so the caller can release the prediction lock before propagating
    /// any error.
    async fn run_locked(&self, next_issue: draw_model::Issue) -> Result<()> {
        let recent_draws = self.draws.latest(RECENT_DRAWS).await?;

        let tasks = PredictionType::ALL.map(|kind| {
            let next_issue = next_issue.clone();
            let recent_draws = recent_draws.clone();
            let predictions = Arc::clone(&self.predictions);
            let llm = Arc::clone(&self.llm);
            let retry = self.retry;
            let events = self.events.clone();
            tokio::spawn(async move {
                run_one(kind, next_issue, recent_draws, predictions, llm, retry, events).await
            })
        });

        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "prediction task panicked");
            }
        }

        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_one(
    kind: PredictionType,
    issue: draw_model::Issue,
    recent_draws: Vec<Draw>,
    predictions: Arc<dyn PredictionStore>,
    llm: Arc<dyn LlmClient>,
    retry: RetryConfig,
    events: EventBus,
) {
    let started = std::time::Instant::now();

    let recent_values = match predictions.recent_values(kind, RECENT_VALUES).await {
        Ok(v) => v,
        Err(e) => {
            warn!(issue = %issue, kind = kind.key(), error = %e, "failed to read recent predictions");
            Vec::new()
        }
    };

    let prompt = prompt::build(kind, &recent_draws, &recent_values);

    let reply = with_retry(
        retry.base,
        retry.ceiling,
        retry.max_attempts,
        |e: &ContractError| matches!(e, ContractError::Unavailable(_) | ContractError::Timeout(_)),
        || async {
            match tokio::time::timeout(LLM_DEADLINE, llm.complete(prompt.clone())).await {
                Ok(r) => r,
                Err(_) => Err(ContractError::Timeout("llm call exceeded 20s deadline".into())),
            }
        },
    )
    .await;

    let reply = match reply {
        Ok(r) => r,
        Err(e) => {
            warn!(issue = %issue, kind = kind.key(), error = %e, "llm call failed");
            return;
        }
    };

    let predicted_value = match validate_predicted_value(kind, &reply) {
        Ok(v) => v,
        Err(e) => {
            warn!(issue = %issue, kind = kind.key(), error = %e, "prediction reply failed grammar check");
            return;
        }
    };

    let prediction = Prediction::new_unresolved(issue.clone(), kind, predicted_value.clone(), Utc::now());
    if let Err(e) = predictions.upsert(&prediction).await {
        warn!(issue = %issue, kind = kind.key(), error = %e, "failed to persist prediction");
        return;
    }

    let duration_ms = started.elapsed().as_millis() as u64;
    info!(issue = %issue, kind = kind.key(), value = %predicted_value, duration_ms, "prediction committed");
    events.publish(PipelineEvent::PredictionCommitted {
        issue,
        prediction_type: kind,
        value: predicted_value,
        duration_ms,
    });
}
