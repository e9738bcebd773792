//! Command-line argument parsing for the `vista` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Vista command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "vista", about = "Endless procedural terrain fly-through")]
pub struct CliArgs {
    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of ticks to run.
    #[arg(long)]
    pub ticks: Option<u32>,

    /// Viewer speed in world units per second.
    #[arg(long)]
    pub speed: Option<f32>,

    /// Worker threads (0 = automatic).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.terrain.noise.seed = seed;
        }
        if let Some(ticks) = args.ticks {
            self.demo.ticks = ticks;
        }
        if let Some(speed) = args.speed {
            self.demo.viewer_speed = speed;
        }
        if let Some(workers) = args.workers {
            self.streaming.worker_threads = workers;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
