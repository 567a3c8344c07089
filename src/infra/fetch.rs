//! HTTP row source for query-result analytics endpoints.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::application::pipeline::RawRow;
use crate::application::sources::{Endpoint, FetchError, RetryPolicy, RowSource, extract_rows};
use crate::config::FetchSettings;
use crate::infra::error::InfraError;

/// Fetches rows over HTTP, retrying per [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct HttpRowSource {
    client: Client,
    policy: RetryPolicy,
}

impl HttpRowSource {
    pub fn new(policy: RetryPolicy) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| InfraError::configuration(format!("http client: {err}")))?;
        Ok(Self { client, policy })
    }

    pub fn from_settings(settings: &FetchSettings) -> Result<Self, InfraError> {
        Self::new(RetryPolicy {
            max_retries: settings.max_retries,
            attempt_timeout: settings.timeout,
            base_backoff: settings.backoff,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("solstate/", env!("CARGO_PKG_VERSION"))
    }

    async fn attempt(&self, endpoint: &Endpoint) -> Result<Vec<RawRow>, FetchError> {
        let label = endpoint.label;
        // The URL may carry the API key, so errors are stripped of it.
        let transport = |err: reqwest::Error| {
            if err.is_timeout() {
                FetchError::Timeout {
                    label,
                    timeout: self.policy.attempt_timeout,
                }
            } else {
                FetchError::Transport {
                    label,
                    message: err.without_url().to_string(),
                }
            }
        };

        let response = self
            .client
            .get(endpoint.url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                label,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        let json = serde_json::from_slice(&body).map_err(|err| FetchError::Shape {
            label,
            message: format!("body is not valid JSON: {err}"),
        })?;
        let rows = extract_rows(json, endpoint.rows_path).map_err(|message| FetchError::Shape {
            label,
            message: format!("{message} (expected rows at `{}`)", endpoint.rows_path_display()),
        })?;

        debug!(
            target = "solstate::infra::fetch",
            dataset = label,
            rows = rows.len(),
            "upstream rows received"
        );
        Ok(rows)
    }
}

#[async_trait]
impl RowSource for HttpRowSource {
    async fn fetch_rows(&self, endpoint: &Endpoint) -> Result<Vec<RawRow>, FetchError> {
        self.policy
            .run(endpoint.label, |_| self.attempt(endpoint))
            .await
    }
}
