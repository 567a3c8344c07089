use std::{process, sync::Arc};

use solstate::{
    application::{
        admin_data::AdminDataService,
        blog::BlogService,
        charts::{ChartStore, UpstreamTarget},
        error::AppError,
        repos::ObjectStore,
    },
    config,
    domain::{datasets::DatasetId, series::BrushInterval},
    infra::{
        error::InfraError,
        fetch::HttpRowSource,
        http::{self, ApiState},
        storage::{FsObjectStore, UnconfiguredStore},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Snapshot(args) => run_snapshot(settings, args).await,
    }
}

fn build_chart_store(settings: &config::Settings) -> Result<ChartStore, AppError> {
    let source = HttpRowSource::from_settings(&settings.fetch)?;
    let target = UpstreamTarget {
        base_url: settings.fetch.base_url.clone(),
        api_key: settings.fetch.api_key.clone(),
    };
    if target.api_key.is_none() {
        warn!(
            target = "solstate::bootstrap",
            "no analytics API key configured; upstream requests will likely fail and serve fallback data"
        );
    }
    Ok(ChartStore::new(Arc::new(source), target).with_brush_window(settings.charts.brush_throttle))
}

fn build_object_store(settings: &config::StorageSettings) -> Arc<dyn ObjectStore> {
    match settings.bucket.as_deref() {
        Some(bucket) => Arc::new(FsObjectStore::new(settings.root.clone(), bucket)),
        None => {
            warn!(
                target = "solstate::bootstrap",
                "storage.bucket is not set; admin and blog routes will fail"
            );
            Arc::new(UnconfiguredStore::new("storage.bucket is not set"))
        }
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let charts = Arc::new(build_chart_store(&settings)?);
    let store = build_object_store(&settings.storage);
    info!(
        target = "solstate::bootstrap",
        storage = %store.location(),
        upstream = %settings.fetch.base_url,
        "starting solstate"
    );

    let warmer = tokio::spawn({
        let charts = charts.clone();
        async move {
            match charts.warm_all().await {
                Ok(fallbacks) => info!(
                    target = "solstate::bootstrap",
                    fallbacks,
                    "chart data warmed"
                ),
                Err(err) => warn!(
                    target = "solstate::bootstrap",
                    error = %err,
                    "chart warmup failed"
                ),
            }
        }
    });

    let state = ApiState {
        charts,
        admin: Arc::new(AdminDataService::new(store.clone())),
        blogs: Arc::new(BlogService::new(store)),
    };
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "solstate::bootstrap",
        addr = %settings.server.addr,
        "listening"
    );

    let result = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")));

    warmer.abort();
    let _ = warmer.await;
    result
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            target = "solstate::bootstrap",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
    info!(target = "solstate::bootstrap", "shutdown requested");
}

async fn run_snapshot(
    settings: config::Settings,
    args: config::SnapshotArgs,
) -> Result<(), AppError> {
    let dataset: DatasetId = args.dataset.parse()?;
    let brush = BrushInterval::from_bounds(args.start.as_deref(), args.end.as_deref())?;

    let charts = build_chart_store(&settings)?;
    let view = charts.view(dataset, brush, args.percent).await?;

    let json = serde_json::to_string_pretty(&view).map_err(InfraError::from)?;
    println!("{json}");
    Ok(())
}
