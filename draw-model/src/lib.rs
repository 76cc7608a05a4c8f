//! Plain data types for the draw ingestion and prediction pipeline.
//!
//! This crate holds no I/O: draws, categories, and predictions, plus the
//! pure grammar/derivation helpers that operate on them. Storage and
//! network behavior live in `draw-core`; the async trait surfaces that
//! connect the two live in `draw-contracts`.

pub mod draw;
pub mod error;
pub mod ids;
pub mod prediction;

pub use draw::{Category, Combination, Draw, NumberTriple, RawDraw};
pub use error::{ModelError, Result};
pub use ids::Issue;
pub use prediction::{
    compute_hit, ground_truth_label, validate_predicted_value, HitRateSnapshot, HitStatus,
    Prediction, PredictionType,
};
