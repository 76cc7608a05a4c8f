use async_trait::async_trait;

use crate::error::Result;

/// System + user prompt pair sent to the prediction LLM.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Black-box call into the external prediction provider (spec.md
/// section 4.8 step 4). The 20s deadline and retry policy live in the
/// concrete implementation; this trait only describes the call shape so
/// tests can substitute a fake.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: Prompt) -> Result<String>;
}
