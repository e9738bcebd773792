//! The binary entry point: flies a viewer over endless terrain and reports
//! what was streamed.

use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use vista_app::fly_through::{self, RunSummary};
use vista_app::platform::{PlatformDirs, PlatformError};
use vista_config::{CliArgs, Config, ConfigError};
use vista_log::{LogError, init_logging};

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("failed to initialize platform directories: {0}")]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    Run(#[from] fly_through::RunError),
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match try_main(&args) {
        Ok(summary) => {
            println!("{summary}");
            if summary.settled {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("vista: {e}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(args: &CliArgs) -> Result<RunSummary, AppError> {
    let dirs = PlatformDirs::resolve(args.config.as_deref())?;
    dirs.create_dirs()?;

    let mut config = Config::load_or_create(&dirs.config_dir)?;
    config.apply_cli_overrides(args);

    let log_file = init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config))?;
    info!(
        config = %dirs.config_dir.display(),
        seed = config.terrain.noise.seed,
        "vista starting"
    );
    if let Some(log_file) = log_file {
        info!(path = %log_file.display(), "writing JSON log");
    }
    if config.terrain.color_bands.is_empty() {
        warn!("no colour bands configured; colouring disabled");
    }

    Ok(fly_through::run(&config)?)
}
