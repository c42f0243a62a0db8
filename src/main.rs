mod adapters;
mod application;
mod config;
mod domain;
mod error;
mod interface;
mod ports;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adapters::{sink, SnapshotPlatform};
use application::{ReportService, ReportSettings};
use config::Config;
use interface::ScriptRuntime;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging (stdout is reserved for results)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("vmdrift={}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("🚀 Starting vmdrift v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    // Initialize adapters
    let platform = SnapshotPlatform::load(&config.snapshot_path)?;
    info!(
        "✓ Loaded platform export {} ({} elements)",
        config.snapshot_path.display(),
        platform.element_count()
    );
    let result_sink = sink::from_target(&config.output_target()?)?;

    let mut service = ReportService::new(
        Arc::new(platform.element_source()),
        Arc::new(platform.trend_source()),
        result_sink,
        ReportSettings::from_config(&config)?,
    );
    if let Some(now) = config.now {
        info!("Using fixed reference time {}", now);
        service = service.with_clock(move || now);
    }

    let runtime = ScriptRuntime::new(config.max_runtime_secs.map(Duration::from_secs));
    let termination = runtime.execute(&service).await;

    Ok(ExitCode::from(termination.exit_code()))
}
