use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::debugging::DebuggingRecorder;
use serde_json::json;
use url::Url;

use solstate::application::pipeline::RawRow;
use solstate::application::sources::{
    Endpoint, FetchError, RetryPolicy, RowSource, fetch_with_fallback,
};
use solstate_api_types::DataSource;

struct AlwaysDown {
    policy: RetryPolicy,
}

#[async_trait]
impl RowSource for AlwaysDown {
    async fn fetch_rows(&self, endpoint: &Endpoint) -> Result<Vec<RawRow>, FetchError> {
        self.policy
            .run(endpoint.label, |_| async {
                Err::<Vec<RawRow>, _>(FetchError::Status {
                    label: endpoint.label,
                    status: 502,
                })
            })
            .await
    }
}

#[tokio::test]
async fn fetch_metrics_are_emitted() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let source = AlwaysDown {
        policy: RetryPolicy {
            max_retries: 1,
            attempt_timeout: Duration::from_secs(1),
            base_backoff: Duration::from_millis(1),
        },
    };
    let endpoint = Endpoint {
        label: "dex-tvl",
        url: Url::parse("http://upstream.test/api/queries/1/results.json").expect("url"),
        rows_path: &[],
    };

    let fetched = fetch_with_fallback(&source, &endpoint, || vec![json!({"fallback": true})]).await;
    assert_eq!(fetched.source, DataSource::Fallback);
    assert_eq!(fetched.rows.len(), 1);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "solstate_fetch_attempt_total",
        "solstate_fetch_failure_total",
        "solstate_fetch_fallback_total",
        "solstate_fetch_ms",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
