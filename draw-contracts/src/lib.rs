//! Async trait surfaces connecting `draw-model`'s plain types to
//! `draw-core`'s concrete Postgres/Redis/HTTP implementations.
//!
//! Every trait here corresponds to one of the lettered components in
//! spec.md section 2: `DrawStore` (H's target), `OmissionStore` /
//! `DailyStatsStore` (I/J), `PredictionStore` (K/L's target),
//! `DedupStore` (B), `LockService` (C), `CacheStore` (D), `SourcePoll`
//! (E), `LlmClient` (the prediction provider K calls out to).

pub mod cache;
pub mod dedup;
pub mod draw_store;
pub mod error;
pub mod events;
pub mod llm;
pub mod prediction_store;
pub mod source;
pub mod stats_store;

pub use cache::CacheStore;
pub use dedup::{DedupStore, LockHandle, LockService};
pub use draw_store::{DrawStore, UpsertOutcome};
pub use error::{ContractError, Result};
pub use events::PipelineEvent;
pub use llm::{LlmClient, Prompt};
pub use prediction_store::PredictionStore;
pub use source::SourcePoll;
pub use stats_store::{DailyStatsStore, OmissionStore};
