//! Configuration error types.

use vista_lod::LodError;
use vista_stream::StreamError;

/// Errors that can occur when loading, saving, parsing, or validating
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the config file to disk.
    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to serialize config to RON.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),

    /// The LOD levels do not form a valid table.
    #[error("invalid lod_levels: {0}")]
    InvalidLod(#[source] LodError),

    /// The streaming settings are inconsistent.
    #[error("invalid streaming settings: {0}")]
    InvalidStreaming(#[source] StreamError),
}
