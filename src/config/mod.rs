//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

pub use cli::{CliArgs, Command, FetchOverrides, ServeArgs, ServeOverrides, SnapshotArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "solstate";
const ENV_PREFIX: &str = "SOLSTATE";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_FETCH_BASE_URL: &str = "https://api.dune.com";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
const DEFAULT_FETCH_MAX_RETRIES: u32 = 2;
const DEFAULT_FETCH_BACKOFF_MILLIS: u64 = 1_000;
const DEFAULT_STORAGE_ROOT: &str = "data";
const DEFAULT_BRUSH_THROTTLE_MILLIS: u64 = 100;
const MAX_FETCH_RETRIES: u32 = 10;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub fetch: FetchSettings,
    pub storage: StorageSettings,
    pub charts: ChartSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub root: PathBuf,
    /// `None` leaves object storage unconfigured; admin and blog routes then
    /// answer with a server error.
    pub bucket: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChartSettings {
    pub brush_throttle: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Snapshot(args)) => raw.apply_fetch_overrides(&args.fetch),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    fetch: RawFetchSettings,
    storage: RawStorageSettings,
    charts: RawChartSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(root) = overrides.storage_root.as_ref() {
            self.storage.root = Some(root.clone());
        }
        if let Some(bucket) = overrides.storage_bucket.as_ref() {
            self.storage.bucket = Some(bucket.clone());
        }
        if let Some(millis) = overrides.brush_throttle_millis {
            self.charts.brush_throttle_millis = Some(millis);
        }

        self.apply_fetch_overrides(&overrides.fetch);
    }

    fn apply_fetch_overrides(&mut self, overrides: &FetchOverrides) {
        if let Some(url) = overrides.base_url.as_ref() {
            self.fetch.base_url = Some(url.clone());
        }
        if let Some(key) = overrides.api_key.as_ref() {
            self.fetch.api_key = Some(key.clone());
        }
        if let Some(seconds) = overrides.timeout_seconds {
            self.fetch.timeout_seconds = Some(seconds);
        }
        if let Some(retries) = overrides.max_retries {
            self.fetch.max_retries = Some(retries);
        }
        if let Some(millis) = overrides.backoff_millis {
            self.fetch.backoff_millis = Some(millis);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            fetch,
            storage,
            charts,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            fetch: build_fetch_settings(fetch)?,
            storage: build_storage_settings(storage)?,
            charts: build_chart_settings(charts)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_fetch_settings(fetch: RawFetchSettings) -> Result<FetchSettings, LoadError> {
    let raw_url = fetch
        .base_url
        .unwrap_or_else(|| DEFAULT_FETCH_BASE_URL.to_string());
    let base_url = Url::parse(raw_url.trim())
        .map_err(|err| LoadError::invalid("fetch.base_url", format!("`{raw_url}`: {err}")))?;
    if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "fetch.base_url",
            format!("`{raw_url}` must be an http(s) URL"),
        ));
    }

    let api_key = fetch
        .api_key
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());

    let timeout = non_zero_u32(
        fetch.timeout_seconds.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
        "fetch.timeout_seconds",
    )?;

    let max_retries = fetch.max_retries.unwrap_or(DEFAULT_FETCH_MAX_RETRIES);
    if max_retries > MAX_FETCH_RETRIES {
        return Err(LoadError::invalid(
            "fetch.max_retries",
            format!("must be at most {MAX_FETCH_RETRIES}"),
        ));
    }

    let backoff = Duration::from_millis(
        fetch.backoff_millis.unwrap_or(DEFAULT_FETCH_BACKOFF_MILLIS),
    );

    Ok(FetchSettings {
        base_url,
        api_key,
        timeout: Duration::from_secs(u64::from(timeout.get())),
        max_retries,
        backoff,
    })
}

fn build_storage_settings(storage: RawStorageSettings) -> Result<StorageSettings, LoadError> {
    let root = storage
        .root
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_ROOT));
    if root.as_os_str().is_empty() {
        return Err(LoadError::invalid("storage.root", "must not be empty"));
    }

    let bucket = storage
        .bucket
        .map(|bucket| bucket.trim().to_string())
        .filter(|bucket| !bucket.is_empty());
    if let Some(bucket) = bucket.as_ref()
        && (bucket.contains(['/', '\\']) || bucket == "." || bucket == "..")
    {
        return Err(LoadError::invalid(
            "storage.bucket",
            format!("`{bucket}` must be a single path segment"),
        ));
    }

    Ok(StorageSettings { root, bucket })
}

fn build_chart_settings(charts: RawChartSettings) -> Result<ChartSettings, LoadError> {
    let millis = non_zero_u32(
        charts
            .brush_throttle_millis
            .unwrap_or(DEFAULT_BRUSH_THROTTLE_MILLIS),
        "charts.brush_throttle_millis",
    )?;
    Ok(ChartSettings {
        brush_throttle: Duration::from_millis(u64::from(millis.get())),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFetchSettings {
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_seconds: Option<u64>,
    max_retries: Option<u32>,
    backoff_millis: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawStorageSettings {
    root: Option<PathBuf>,
    bucket: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawChartSettings {
    brush_throttle_millis: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
