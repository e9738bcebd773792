//! Per-chunk streaming state.

use std::sync::Arc;

use glam::Vec2;
use rustc_hash::FxHashMap;
use vista_lod::ChunkBounds;
use vista_mesh::MeshData;
use vista_terrain::HeightField;

use crate::error::JobError;

/// Integer grid position of a chunk. Chunk `(x, y)` is centred on world
/// position `(x * edge, y * edge)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The chunk whose centre is nearest to `position`.
    pub fn from_world(position: Vec2, edge: f32) -> Self {
        Self {
            x: (position.x / edge).round() as i32,
            y: (position.y / edge).round() as i32,
        }
    }

    /// Returns the coordinate offset by `(dx, dy)`.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// World-space centre of the chunk.
    pub fn world_centre(self, edge: f32) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32) * edge
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Height-field generation state. Moves from `Pending` to `Ready` or
/// `Failed` exactly once.
#[derive(Clone, Debug)]
pub enum HeightState {
    Pending,
    Ready(Arc<HeightField>),
    Failed(JobError),
}

/// State of one LOD slot. A slot exists from the moment its mesh job is
/// submitted, so a present slot means the mesh is never requested again.
#[derive(Clone, Debug)]
pub enum LodMeshState {
    Pending,
    Ready(Arc<MeshData>),
    Failed(JobError),
}

/// A terrain chunk tracked by the streamer.
#[derive(Debug)]
pub struct TerrainChunk {
    coord: ChunkCoord,
    centre: Vec2,
    bounds: ChunkBounds,
    height: HeightState,
    meshes: FxHashMap<u8, LodMeshState>,
    visible: bool,
    displayed_lod: Option<u8>,
}

impl TerrainChunk {
    pub fn new(coord: ChunkCoord, edge: f32) -> Self {
        let centre = coord.world_centre(edge);
        Self {
            coord,
            centre,
            bounds: ChunkBounds::new(centre, edge),
            height: HeightState::Pending,
            meshes: FxHashMap::default(),
            visible: false,
            displayed_lod: None,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    pub fn centre(&self) -> Vec2 {
        self.centre
    }

    pub fn bounds(&self) -> &ChunkBounds {
        &self.bounds
    }

    pub fn height_state(&self) -> &HeightState {
        &self.height
    }

    /// The height field, once generated.
    pub fn height_field(&self) -> Option<&Arc<HeightField>> {
        match &self.height {
            HeightState::Ready(field) => Some(field),
            _ => None,
        }
    }

    pub fn is_height_ready(&self) -> bool {
        matches!(self.height, HeightState::Ready(_))
    }

    pub fn generation_failed(&self) -> bool {
        matches!(self.height, HeightState::Failed(_))
    }

    pub fn mesh_state(&self, lod: u8) -> Option<&LodMeshState> {
        self.meshes.get(&lod)
    }

    /// The mesh built for `lod`, if it is ready.
    pub fn mesh(&self, lod: u8) -> Option<&Arc<MeshData>> {
        match self.meshes.get(&lod) {
            Some(LodMeshState::Ready(mesh)) => Some(mesh),
            _ => None,
        }
    }

    /// LODs with a slot in any state, ascending.
    pub fn requested_lods(&self) -> Vec<u8> {
        let mut lods: Vec<u8> = self.meshes.keys().copied().collect();
        lods.sort_unstable();
        lods
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The LOD currently handed to the renderer.
    pub fn displayed_lod(&self) -> Option<u8> {
        self.displayed_lod
    }

    /// Store the generation result. Returns `false` (and changes nothing) if
    /// the height is no longer pending.
    pub(crate) fn resolve_height(&mut self, state: HeightState) -> bool {
        if !matches!(self.height, HeightState::Pending) {
            return false;
        }
        self.height = state;
        true
    }

    /// Claim the slot for `lod`. Returns `false` if it already exists.
    pub(crate) fn claim_lod(&mut self, lod: u8) -> bool {
        if self.meshes.contains_key(&lod) {
            return false;
        }
        self.meshes.insert(lod, LodMeshState::Pending);
        true
    }

    /// Store a mesh result. Returns `false` unless the slot was pending.
    pub(crate) fn resolve_lod(&mut self, lod: u8, state: LodMeshState) -> bool {
        match self.meshes.get_mut(&lod) {
            Some(slot @ LodMeshState::Pending) => {
                *slot = state;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn set_visible(&mut self, visible: bool) -> bool {
        let changed = self.visible != visible;
        self.visible = visible;
        changed
    }

    pub(crate) fn set_displayed_lod(&mut self, lod: u8) {
        self.displayed_lod = Some(lod);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_from_world_rounds_to_nearest_centre() {
        assert_eq!(ChunkCoord::from_world(Vec2::ZERO, 240.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world(Vec2::new(119.0, -119.0), 240.0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_world(Vec2::new(121.0, -121.0), 240.0), ChunkCoord::new(1, -1));
        assert_eq!(ChunkCoord::from_world(Vec2::new(420.0, 0.0), 240.0), ChunkCoord::new(2, 0));
    }

    #[test]
    fn test_chunk_bounds_match_coord() {
        let chunk = TerrainChunk::new(ChunkCoord::new(2, -1), 240.0);
        assert_eq!(chunk.centre(), Vec2::new(480.0, -240.0));
        assert_eq!(chunk.bounds().half_extent, 120.0);
        assert!(chunk.bounds().contains(Vec2::new(360.0, -360.0)));
    }

    #[test]
    fn test_new_chunk_is_pending_and_hidden() {
        let chunk = TerrainChunk::new(ChunkCoord::new(0, 0), 240.0);
        assert!(matches!(chunk.height_state(), HeightState::Pending));
        assert!(!chunk.is_visible());
        assert_eq!(chunk.displayed_lod(), None);
        assert!(chunk.requested_lods().is_empty());
    }

    #[test]
    fn test_height_resolves_once() {
        let mut chunk = TerrainChunk::new(ChunkCoord::new(0, 0), 10.0);
        let field = Arc::new(HeightField::flat(11, 0.5));
        assert!(chunk.resolve_height(HeightState::Ready(Arc::clone(&field))));
        assert!(!chunk.resolve_height(HeightState::Failed(JobError::Disconnected)));
        assert!(chunk.is_height_ready());
        assert!(Arc::ptr_eq(chunk.height_field().unwrap(), &field));
    }

    #[test]
    fn test_lod_slot_claimed_once() {
        let mut chunk = TerrainChunk::new(ChunkCoord::new(0, 0), 10.0);
        assert!(chunk.claim_lod(3));
        assert!(!chunk.claim_lod(3));
        assert!(matches!(chunk.mesh_state(3), Some(LodMeshState::Pending)));

        assert!(chunk.resolve_lod(3, LodMeshState::Ready(Arc::new(MeshData::default()))));
        assert!(!chunk.resolve_lod(3, LodMeshState::Failed(JobError::Disconnected)));
        assert!(chunk.mesh(3).is_some());
        assert!(!chunk.resolve_lod(1, LodMeshState::Failed(JobError::Disconnected)));
        assert_eq!(chunk.requested_lods(), vec![3]);
    }
}
