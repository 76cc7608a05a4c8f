//! Concrete implementations of the `draw-contracts` traits: Postgres
//! for durable storage, Redis for the distributed cache/dedup/lock
//! tier (with a bounded local fallback when Redis is unhealthy), and a
//! reqwest-backed LLM client.

pub mod llm;
pub mod local_fallback;
pub mod postgres;
pub mod redis;
