//! Source Poller (spec.md section 4.2, component E): one GET-and-parse
//! cycle against a single configured upstream. `start`/`stop` scheduling
//! lives in the server's wiring (tokio interval tasks); this type is
//! just the `SourcePoll` implementation each scheduled tick calls.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use draw_config::SourceConfig;
use draw_contracts::source::SourcePoll;
use draw_contracts::ContractError;
use draw_model::{Issue, RawDraw};
use tracing::warn;

use crate::parsers;
use crate::validate::parse_open_time;

const FETCH_DEADLINE: Duration = Duration::from_secs(8);

pub struct HttpSourcePoller {
    config: SourceConfig,
    client: reqwest::Client,
}

impl HttpSourcePoller {
    pub fn new(config: SourceConfig) -> Self {
        let mut builder = reqwest::Client::builder().timeout(FETCH_DEADLINE);
        if config.skip_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder.build().expect("reqwest client configuration is valid");
        Self { config, client }
    }
}

#[async_trait]
impl SourcePoll for HttpSourcePoller {
    async fn poll_once(&self) -> draw_contracts::Result<Option<RawDraw>> {
        let mut req = self.client.get(&self.config.url);
        for (name, value) in &self.config.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let response = match req.send().await {
            Ok(r) => r,
            Err(_) => return Ok(None),
        };
        if !response.status().is_success() {
            return Ok(None);
        }
        let body = match response.bytes().await {
            Ok(b) => b,
            Err(_) => return Ok(None),
        };

        let parsed = match parsers::parse(self.config.parser_id, &body) {
            Ok(Some(p)) => p,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(source = %self.config.name, error = %e, "parser failure");
                return Ok(None);
            }
        };

        let issue = match Issue::parse(parsed.issue.clone()) {
            Ok(i) => i,
            Err(_) => {
                warn!(source = %self.config.name, issue = %parsed.issue, "malformed issue, dropping");
                return Ok(None);
            }
        };

        let open_time = match parse_open_time(&parsed.open_time_raw, Utc::now()) {
            Ok(t) => t,
            Err(e) => {
                warn!(source = %self.config.name, error = %e, "unparseable open_time, dropping");
                return Ok(None);
            }
        };

        let sum = match parsed.sum {
            Some(s) => s,
            None => {
                // Universal parser may omit sum; compute it from the
                // normalized digits so downstream sum-consistency
                // validation has something to check against.
                match draw_model::NumberTriple::parse_canonical(&parsed.open_nums_raw) {
                    Ok(t) => t.sum(),
                    Err(_) => return Ok(None),
                }
            }
        };

        Ok(Some(RawDraw {
            issue,
            open_time,
            open_nums: parsed.open_nums_raw,
            sum,
            source: self.config.name.clone(),
        }))
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}

impl From<crate::error::PipelineError> for ContractError {
    fn from(e: crate::error::PipelineError) -> Self {
        ContractError::Backend(e.to_string())
    }
}
