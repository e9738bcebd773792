//! Streaming error types.

use vista_lod::LodError;

/// Why a background job produced no result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    /// The job panicked; the payload message is kept for diagnostics.
    #[error("job panicked: {0}")]
    Panicked(String),

    /// The work engine has shut down and no longer accepts jobs.
    #[error("work engine is shut down")]
    Disconnected,
}

/// Errors that can occur when constructing a streamer.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// The LOD table does not fit the chunk sample size.
    #[error("invalid LOD configuration: {0}")]
    Lod(#[from] LodError),

    /// The viewer movement threshold is negative or not finite.
    #[error("viewer move threshold must be finite and non-negative, got {0}")]
    InvalidMoveThreshold(f32),

    /// The height multiplier is not finite.
    #[error("height multiplier must be finite, got {0}")]
    InvalidHeightMultiplier(f32),
}
