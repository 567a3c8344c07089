use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use serde_json::{Value, json};

fn solstate() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("solstate"));
    cmd.env_remove("SOLSTATE_API_KEY")
        .env_remove("SOLSTATE_CONFIG_FILE")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn snapshot_prints_live_view_as_json() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/api/queries/4281214/results.json")
            .query_param("api_key", "cli-key");
        then.status(200).json_body(json!([
            {"date": "2024-03-01", "pool": "SOL-USDC", "volume": 4.0},
            {"date": "2024-03-02", "pool": "SOL-USDC", "volume": 6.0},
        ]));
    });

    let assert = solstate()
        .args(["snapshot", "pool-volume", "--fetch-api-key", "cli-key"])
        .args(["--fetch-base-url", &server.base_url()])
        .args(["--start", "2024-03-02", "--end", "2024-03-02"])
        .assert()
        .success();

    mock.assert();
    let view: Value = serde_json::from_slice(&assert.get_output().stdout).expect("json on stdout");
    assert_eq!(view["source"], "live");
    assert_eq!(view["rows"].as_array().map(Vec::len), Some(1));
    assert_eq!(view["rows"][0]["values"], json!([6.0]));
}

#[test]
fn snapshot_falls_back_when_upstream_is_down() {
    let assert = solstate()
        .args(["snapshot", "dex-tvl", "--fetch-base-url", "http://127.0.0.1:9"])
        .args(["--fetch-max-retries", "0"])
        .assert()
        .success();

    let view: Value = serde_json::from_slice(&assert.get_output().stdout).expect("json on stdout");
    assert_eq!(view["source"], "fallback");
    assert_eq!(view["percent"], true);
}

#[test]
fn unknown_dataset_fails() {
    solstate()
        .args(["snapshot", "nft-floor", "--fetch-base-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(contains("dataset"));
}
