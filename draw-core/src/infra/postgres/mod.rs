pub mod daily_stats_store;
pub mod draw_store;
pub mod omission_store;
pub mod pool;
pub mod prediction_store;

pub use pool::{HealthMonitor, PostgresPools};
