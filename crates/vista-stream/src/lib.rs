//! Chunk streaming: asynchronous height-field and mesh generation around a
//! moving viewer, with per-chunk LOD caching and single-flight requests.

mod chunk;
mod error;
mod registry;
mod renderer;
mod streamer;
mod work_engine;

pub use chunk::{ChunkCoord, HeightState, LodMeshState, TerrainChunk};
pub use error::{JobError, StreamError};
pub use registry::ChunkRegistry;
pub use renderer::{NullRenderer, RecordingRenderer, RenderEvent, TerrainRenderer};
pub use streamer::{
    ChunkStreamer, LodRequest, StreamStats, StreamerSettings, TickReport, ViewerState,
};
pub use work_engine::{WorkEngine, default_worker_count};
