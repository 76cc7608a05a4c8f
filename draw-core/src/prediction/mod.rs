//! Prediction subsystem: the orchestrator (K) that drives four
//! concurrent prediction tasks per committed draw, the verifier (L)
//! that resolves them against ground truth, and prompt construction.

pub mod orchestrator;
pub mod prompt;
pub mod verifier;

pub use orchestrator::PredictionOrchestrator;
pub use verifier::PredictionVerifier;
