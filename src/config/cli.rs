use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the solstate binary.
#[derive(Debug, Parser)]
#[command(name = "solstate", version, about = "State of Solana chart data service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "SOLSTATE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(Box<ServeArgs>),
    /// Fetch one dataset and print its chart view as JSON.
    Snapshot(SnapshotArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct FetchOverrides {
    /// Override the analytics API base URL.
    #[arg(long = "fetch-base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Override the analytics API key.
    #[arg(long = "fetch-api-key", env = "SOLSTATE_API_KEY", value_name = "KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Override the per-attempt timeout.
    #[arg(long = "fetch-timeout-seconds", value_name = "SECONDS")]
    pub timeout_seconds: Option<u64>,

    /// Override the number of retries after the first attempt.
    #[arg(long = "fetch-max-retries", value_name = "COUNT")]
    pub max_retries: Option<u32>,

    /// Override the base backoff between attempts.
    #[arg(long = "fetch-backoff-millis", value_name = "MILLIS")]
    pub backoff_millis: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub fetch: FetchOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the object storage root directory.
    #[arg(long = "storage-root", value_name = "PATH")]
    pub storage_root: Option<PathBuf>,

    /// Override the object storage bucket.
    #[arg(long = "storage-bucket", value_name = "NAME")]
    pub storage_bucket: Option<String>,

    /// Override the minimum spacing between brush re-aggregations.
    #[arg(long = "charts-brush-throttle-millis", value_name = "MILLIS")]
    pub brush_throttle_millis: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub fetch: FetchOverrides,

    /// Dataset slug, e.g. `dex-tvl`.
    #[arg(value_name = "DATASET")]
    pub dataset: String,

    /// First day of the brush (YYYY-MM-DD).
    #[arg(long, value_name = "DATE", requires = "end")]
    pub start: Option<String>,

    /// Last day of the brush (YYYY-MM-DD).
    #[arg(long, value_name = "DATE", requires = "start")]
    pub end: Option<String>,

    /// Render values as per-bucket percentages.
    #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub percent: Option<bool>,
}
