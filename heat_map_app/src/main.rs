mod app_config;
mod frame_pipeline;
mod local_source;

use anyhow::{Context, Result};
use app_config::AppConfig;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "heat_map_app", about = "Accumulate per-frame detections into a sliding-window heat map")]
struct Args {
    /// Application config (data source, parameter file, output settings).
    #[arg(long, value_name = "PATH", default_value = "config/heat_map_app.yaml")]
    config_path: PathBuf,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let config = AppConfig::load(&args.config_path)
        .with_context(|| format!("loading config {}", args.config_path.display()))?;

    let summary = frame_pipeline::run(config).await?;
    info!(
        frames = summary.frames,
        rejected = summary.rejected,
        video = %summary.video_path.display(),
        "done"
    );
    Ok(())
}
