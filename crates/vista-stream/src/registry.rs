//! Owner of every chunk the streamer has created, keyed by [`ChunkCoord`].

use rustc_hash::FxHashMap;

use crate::chunk::{ChunkCoord, TerrainChunk};

/// O(1) lookup of chunks by grid coordinate. At most one chunk exists per
/// coordinate.
#[derive(Debug, Default)]
pub struct ChunkRegistry {
    chunks: FxHashMap<ChunkCoord, TerrainChunk>,
}

impl ChunkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chunk. Returns `false` and leaves the registry unchanged if
    /// its coordinate is already taken.
    pub fn insert(&mut self, chunk: TerrainChunk) -> bool {
        let coord = chunk.coord();
        if self.chunks.contains_key(&coord) {
            return false;
        }
        self.chunks.insert(coord, chunk);
        true
    }

    /// Remove and return the chunk at `coord`.
    pub fn retire(&mut self, coord: ChunkCoord) -> Option<TerrainChunk> {
        self.chunks.remove(&coord)
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<&TerrainChunk> {
        self.chunks.get(&coord)
    }

    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut TerrainChunk> {
        self.chunks.get_mut(&coord)
    }

    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Iterate all chunks in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &TerrainChunk> {
        self.chunks.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut registry = ChunkRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.insert(TerrainChunk::new(ChunkCoord::new(1, 2), 240.0)));
        assert!(registry.contains(ChunkCoord::new(1, 2)));
        assert_eq!(registry.get(ChunkCoord::new(1, 2)).unwrap().coord(), ChunkCoord::new(1, 2));
        assert!(registry.get(ChunkCoord::new(2, 1)).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut registry = ChunkRegistry::new();
        assert!(registry.insert(TerrainChunk::new(ChunkCoord::new(0, 0), 240.0)));
        registry
            .get_mut(ChunkCoord::new(0, 0))
            .unwrap()
            .set_visible(true);

        assert!(!registry.insert(TerrainChunk::new(ChunkCoord::new(0, 0), 240.0)));
        assert_eq!(registry.len(), 1);
        // The original chunk is untouched.
        assert!(registry.get(ChunkCoord::new(0, 0)).unwrap().is_visible());
    }

    #[test]
    fn test_retire() {
        let mut registry = ChunkRegistry::new();
        registry.insert(TerrainChunk::new(ChunkCoord::new(-3, 4), 240.0));
        let retired = registry.retire(ChunkCoord::new(-3, 4)).unwrap();
        assert_eq!(retired.coord(), ChunkCoord::new(-3, 4));
        assert!(registry.retire(ChunkCoord::new(-3, 4)).is_none());
        assert!(registry.is_empty());
    }
}
