use anyhow::Result;
use clap::Parser;
use healthtrust_common::observability::{LogConfig, init_logging};
use healthtrust_config::{HealthTrustConfig, HealthTrustConfigLoader};

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // file is optional; env wins
    let cfg: HealthTrustConfig = HealthTrustConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()?;

    let log_path = init_logging(LogConfig {
        app_name: "healthtrust",
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cfg.logging.emit_stderr || cli.verbose,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    tracing::debug!(log = %log_path.display(), config = %cli.config.display(), "healthtrust.start");

    commands::run(cli, cfg).await
}
