//! Configuration for Vista terrain streaming.
//!
//! Settings persist to disk as a RON file, with every section falling back to
//! defaults when missing. CLI flags (clap) override loaded values, and the
//! terrain and streaming sections convert into validated
//! [`StreamerSettings`](vista_stream::StreamerSettings).

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, Config, DebugConfig, DemoConfig, StreamingConfig, TerrainConfig,
};
pub use error::ConfigError;
