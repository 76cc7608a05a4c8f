use serde::Deserialize;
use std::collections::HashMap;

/// Which parser to dispatch a source's response body to (spec.md
/// section 6.1). Kept as a closed enum per spec.md section 9 rather
/// than a dynamic name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserId {
    TabularSumFeed,
    KenoReductionFeed,
    Universal,
}

/// One configured upstream source (spec.md section 6.1).
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    pub interval_ms: u64,
    pub parser_id: ParserId,
    #[serde(default)]
    pub skip_tls: bool,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl SourceConfig {
    /// Poll interval clamped to the 500ms-2s range spec.md section 4.2
    /// requires.
    pub fn clamped_interval_ms(&self) -> u64 {
        self.interval_ms.clamp(500, 2_000)
    }
}
