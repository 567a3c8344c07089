//! Upstream analytics sources: the fetch seam, its retry policy and the
//! fallback wrapper charts go through.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde_json::Value;
use solstate_api_types::DataSource;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use super::pipeline::RawRow;

/// Where to fetch a dataset and where its rows sit inside the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Dataset slug, used for logs and metric labels.
    pub label: &'static str,
    pub url: Url,
    /// Keys leading to the row array; empty when the body is the array.
    pub rows_path: &'static [&'static str],
}

impl Endpoint {
    pub fn rows_path_display(&self) -> String {
        if self.rows_path.is_empty() {
            "<root>".to_string()
        } else {
            self.rows_path.join(".")
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to `{label}` timed out after {timeout:?}")]
    Timeout {
        label: &'static str,
        timeout: Duration,
    },
    #[error("request to `{label}` failed: {message}")]
    Transport {
        label: &'static str,
        message: String,
    },
    #[error("`{label}` responded with status {status}")]
    Status { label: &'static str, status: u16 },
    #[error("unexpected response shape from `{label}`: {message}")]
    Shape {
        label: &'static str,
        message: String,
    },
}

impl FetchError {
    /// Shape errors mean the endpoint answered with something we cannot use;
    /// asking again will not help.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Shape { .. })
    }
}

#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self, endpoint: &Endpoint) -> Result<Vec<RawRow>, FetchError>;
}

/// Walk `path` into `body` and return the row array found there.
pub fn extract_rows(body: Value, path: &[&str]) -> Result<Vec<RawRow>, String> {
    let mut current = body;
    for (depth, key) in path.iter().enumerate() {
        current = match current {
            Value::Object(mut object) => object.remove(*key).ok_or_else(|| {
                format!("missing `{}`", path[..=depth].join("."))
            })?,
            _ => {
                return Err(format!(
                    "expected an object at `{}`",
                    if depth == 0 {
                        "<root>".to_string()
                    } else {
                        path[..depth].join(".")
                    }
                ));
            }
        };
    }

    match current {
        Value::Array(rows) => Ok(rows),
        other => Err(format!(
            "expected an array of rows, found {}",
            json_kind(&other)
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Attempts, per-attempt timeout and exponential backoff for upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub attempt_timeout: Duration,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            attempt_timeout: Duration::from_secs(20),
            base_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): `base`, `2 * base`, `4 * base`, …
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor)
    }

    /// Run `attempt` until it succeeds, fails with a non-retryable error, or
    /// the retries are used up. Each attempt is cancelled after the timeout.
    pub async fn run<T, F, Fut>(&self, label: &'static str, mut attempt: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut number = 0u32;
        loop {
            counter!("solstate_fetch_attempt_total", "dataset" => label).increment(1);
            let started = Instant::now();
            let outcome = match tokio::time::timeout(self.attempt_timeout, attempt(number)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchError::Timeout {
                    label,
                    timeout: self.attempt_timeout,
                }),
            };
            histogram!("solstate_fetch_ms", "dataset" => label)
                .record(started.elapsed().as_secs_f64() * 1000.0);

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            counter!("solstate_fetch_failure_total", "dataset" => label).increment(1);

            if !error.is_retryable() || number >= self.max_retries {
                return Err(error);
            }

            number += 1;
            let delay = self.backoff(number);
            warn!(
                target = "solstate::sources",
                dataset = label,
                attempt = number,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "upstream fetch failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Rows together with where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub rows: Vec<RawRow>,
    pub source: DataSource,
}

/// Fetch from `source`, substituting `fallback()` on any failure.
///
/// Never fails; the error is logged and the result is tagged
/// [`DataSource::Fallback`].
pub async fn fetch_with_fallback<F>(source: &dyn RowSource, endpoint: &Endpoint, fallback: F) -> Fetched
where
    F: FnOnce() -> Vec<RawRow>,
{
    match source.fetch_rows(endpoint).await {
        Ok(rows) => {
            debug!(
                target = "solstate::sources",
                dataset = endpoint.label,
                rows = rows.len(),
                "fetched live rows"
            );
            Fetched {
                rows,
                source: DataSource::Live,
            }
        }
        Err(error) => {
            counter!("solstate_fetch_fallback_total", "dataset" => endpoint.label).increment(1);
            warn!(
                target = "solstate::sources",
                dataset = endpoint.label,
                error = %error,
                "serving bundled fallback rows"
            );
            Fetched {
                rows: fallback(),
                source: DataSource::Fallback,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const QUERY_RESULT: &[&str] = &["query_result", "data", "rows"];

    #[test]
    fn extracts_nested_rows() {
        let body = json!({"query_result": {"data": {"rows": [{"a": 1}, {"a": 2}]}}});
        assert_eq!(extract_rows(body, QUERY_RESULT).expect("rows").len(), 2);
    }

    #[test]
    fn bare_array_uses_empty_path() {
        let rows = extract_rows(json!([{"a": 1}]), &[]).expect("rows");
        assert_eq!(rows, vec![json!({"a": 1})]);
    }

    #[test]
    fn missing_key_names_the_path() {
        let err = extract_rows(json!({"query_result": {}}), QUERY_RESULT).expect_err("shape");
        assert_eq!(err, "missing `query_result.data`");
    }

    #[test]
    fn non_array_rows_are_rejected() {
        let err = extract_rows(json!({"query_result": {"data": {"rows": 3}}}), QUERY_RESULT)
            .expect_err("shape");
        assert!(err.contains("a number"));
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_then_gives_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::default();
        let started = tokio::time::Instant::now();

        let result: Result<(), _> = policy
            .run("test", |_| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FetchError::Status {
                        label: "test",
                        status: 503,
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn shape_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let result: Result<(), _> = RetryPolicy::default()
            .run("test", |_| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FetchError::Shape {
                        label: "test",
                        message: "missing `query_result`".to_string(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(FetchError::Shape { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempts_time_out() {
        let policy = RetryPolicy {
            max_retries: 1,
            ..RetryPolicy::default()
        };
        let result: Result<(), _> = policy
            .run("test", |_| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(FetchError::Timeout { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_a_retry() {
        let result = RetryPolicy::default()
            .run("test", |attempt| async move {
                if attempt == 0 {
                    Err(FetchError::Transport {
                        label: "test",
                        message: "connection reset".to_string(),
                    })
                } else {
                    Ok(attempt)
                }
            })
            .await;
        assert_eq!(result.expect("second attempt"), 1);
    }

    struct Unreachable;

    #[async_trait]
    impl RowSource for Unreachable {
        async fn fetch_rows(&self, endpoint: &Endpoint) -> Result<Vec<RawRow>, FetchError> {
            Err(FetchError::Timeout {
                label: endpoint.label,
                timeout: Duration::from_secs(20),
            })
        }
    }

    #[tokio::test]
    async fn fallback_wrapper_never_fails() {
        let endpoint = Endpoint {
            label: "dex-tvl",
            url: Url::parse("http://localhost/rows").expect("url"),
            rows_path: QUERY_RESULT,
        };
        let fetched =
            fetch_with_fallback(&Unreachable, &endpoint, || vec![json!({"cached": true})]).await;
        assert_eq!(fetched.source, DataSource::Fallback);
        assert_eq!(fetched.rows, vec![json!({"cached": true})]);
    }

    struct Hanging {
        policy: RetryPolicy,
        calls: AtomicU32,
    }

    #[async_trait]
    impl RowSource for Hanging {
        async fn fetch_rows(&self, endpoint: &Endpoint) -> Result<Vec<RawRow>, FetchError> {
            self.policy
                .run(endpoint.label, |_| {
                    self.calls.fetch_add(1, Ordering::SeqCst);
                    std::future::pending::<Result<Vec<RawRow>, FetchError>>()
                })
                .await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn endpoint_timing_out_every_attempt_resolves_to_fallback() {
        let source = Hanging {
            policy: RetryPolicy::default(),
            calls: AtomicU32::new(0),
        };
        let endpoint = Endpoint {
            label: "dex-tvl",
            url: Url::parse("http://localhost/rows").expect("url"),
            rows_path: QUERY_RESULT,
        };
        let started = tokio::time::Instant::now();

        let fetched =
            fetch_with_fallback(&source, &endpoint, || vec![json!({"cached": true})]).await;

        assert_eq!(fetched.source, DataSource::Fallback);
        assert_eq!(fetched.rows, vec![json!({"cached": true})]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        // three 20 s timeouts plus 1 s and 2 s of backoff
        assert_eq!(started.elapsed(), Duration::from_secs(3 * 20 + 1 + 2));
    }
}
