//! HTTP-backed `LlmClient` (spec.md section 4.8 step 4): a bearer-auth
//! POST to the configured endpoint with a 20s deadline, retried on the
//! transient status/transport classes from the shared retry policy.

use std::time::Duration;

use async_trait::async_trait;
use draw_config::RetryConfig;
use draw_contracts::{ContractError, LlmClient, Prompt, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::retry::{classify_http_status, with_retry, ErrorClass};

const LLM_DEADLINE: Duration = Duration::from_secs(20);

#[derive(Serialize)]
struct CompletionRequest<'a> {
    system: &'a str,
    user: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    output: String,
}

pub struct HttpLlmClient {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpLlmClient {
    pub fn new(endpoint: String, api_key: String, retry: RetryConfig) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .expect("reqwest client configuration is valid");
        Self {
            endpoint,
            api_key,
            client,
            retry,
        }
    }

    async fn call_once(&self, prompt: &Prompt) -> std::result::Result<String, ContractError> {
        let body = CompletionRequest {
            system: &prompt.system,
            user: &prompt.user,
        };

        let sent = tokio::time::timeout(
            LLM_DEADLINE,
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send(),
        )
        .await;

        let response = match sent {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => return Err(ContractError::Unavailable(e.to_string())),
            Err(_) => return Err(ContractError::Timeout("llm call exceeded 20s deadline".into())),
        };

        if !response.status().is_success() {
            let status = response.status();
            let class = classify_http_status(status);
            let msg = format!("llm endpoint returned {status}");
            return Err(match class {
                ErrorClass::TransientTransport => ContractError::Unavailable(msg),
                _ => ContractError::Backend(msg),
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ContractError::Serialization(e.to_string()))?;
        Ok(parsed.output)
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: Prompt) -> Result<String> {
        let attempt = || {
            let prompt = Prompt {
                system: prompt.system.clone(),
                user: prompt.user.clone(),
            };
            async move { self.call_once(&prompt).await }
        };

        with_retry(
            self.retry.base,
            self.retry.ceiling,
            self.retry.max_attempts,
            |e: &ContractError| matches!(e, ContractError::Unavailable(_) | ContractError::Timeout(_)),
            attempt,
        )
        .await
        .inspect_err(|e| warn!(error = %e, "llm call exhausted retries"))
    }
}
