use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use endpoint_monitor::config::EndpointConfig;
use endpoint_monitor::monitoring::{
    HttpProber, MonitoringExecutor, MonitoringScheduler, TracingSink,
};
use logger::LogOptions;

/// Probe configured HTTP endpoints every 15 seconds and report availability
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Endpoint list (.yaml, .yml, .json or .toml)
    config_file: PathBuf,

    /// Directory for the daily log file
    #[arg(long, default_value = "endpoint_monitor_logs")]
    log_dir: PathBuf,

    /// Only log to stdout
    #[arg(long)]
    no_log_file: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = logger::init_with(LogOptions {
        log_dir: (!cli.no_log_file).then(|| cli.log_dir.clone()),
        file_suffix: "endpoint_monitoring.log".into(),
        ..LogOptions::default()
    })
    .context("failed to initialise logging")?;
    if let Some(path) = log_file {
        info!("Writing logs to {}", path.display());
    }

    let config = EndpointConfig::from_path(&cli.config_file)
        .with_context(|| format!("failed to load {}", cli.config_file.display()))?;
    info!("{}", config.to_string().trim_end());

    let sink = Arc::new(TracingSink);
    let prober = HttpProber::new(sink.clone()).context("failed to create HTTP prober")?;
    let mut scheduler =
        MonitoringScheduler::new(MonitoringExecutor::new(Arc::new(prober)), config.endpoints, sink);

    let shutdown = CancellationToken::new();
    let signal_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            shutdown.cancel();
        }
    });

    scheduler.run(shutdown).await;
    signal_task.abort();

    Ok(())
}
