//! Hooks through which the streamer hands results to a renderer.

use std::sync::Arc;

use vista_mesh::MeshData;
use vista_terrain::ColorBuffer;

use crate::chunk::ChunkCoord;

/// Receives chunk updates from the streamer.
///
/// All calls happen on the thread that ticks the streamer, never on a
/// worker.
pub trait TerrainRenderer {
    /// The chunk became visible or hidden.
    fn on_visibility_changed(&mut self, coord: ChunkCoord, visible: bool);

    /// The chunk should now be drawn with `mesh`.
    fn on_mesh_ready(&mut self, coord: ChunkCoord, mesh: Arc<MeshData>);

    /// Colours for the chunk's height field are available.
    fn on_color_ready(&mut self, coord: ChunkCoord, colors: Arc<ColorBuffer>);
}

/// Discards every update.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl TerrainRenderer for NullRenderer {
    fn on_visibility_changed(&mut self, _coord: ChunkCoord, _visible: bool) {}
    fn on_mesh_ready(&mut self, _coord: ChunkCoord, _mesh: Arc<MeshData>) {}
    fn on_color_ready(&mut self, _coord: ChunkCoord, _colors: Arc<ColorBuffer>) {}
}

/// One update received by a [`RecordingRenderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderEvent {
    Visibility { coord: ChunkCoord, visible: bool },
    Mesh { coord: ChunkCoord, lod: u8 },
    Color { coord: ChunkCoord },
}

/// Records every update in order. Useful for headless runs and tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingRenderer {
    pub events: Vec<RenderEvent>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the recorded events, leaving the log empty.
    pub fn take_events(&mut self) -> Vec<RenderEvent> {
        std::mem::take(&mut self.events)
    }

    /// Mesh events for `coord`, as LOD levels in arrival order.
    pub fn meshes_for(&self, coord: ChunkCoord) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                RenderEvent::Mesh { coord: c, lod } if c == coord => Some(lod),
                _ => None,
            })
            .collect()
    }
}

impl TerrainRenderer for RecordingRenderer {
    fn on_visibility_changed(&mut self, coord: ChunkCoord, visible: bool) {
        self.events.push(RenderEvent::Visibility { coord, visible });
    }

    fn on_mesh_ready(&mut self, coord: ChunkCoord, mesh: Arc<MeshData>) {
        self.events.push(RenderEvent::Mesh { coord, lod: mesh.lod });
    }

    fn on_color_ready(&mut self, coord: ChunkCoord, _colors: Arc<ColorBuffer>) {
        self.events.push(RenderEvent::Color { coord });
    }
}
