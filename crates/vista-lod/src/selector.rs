//! Distance-based LOD selection over an ordered table of LOD descriptors.

use serde::{Deserialize, Serialize};

/// Coarsest supported LOD level. Its stride (12) is the largest that still
/// divides a 240-unit chunk edge.
pub const MAX_LOD: u8 = 6;

/// Renderer ceiling on vertices per mesh (255 × 255).
pub const MAX_MESH_VERTICES: usize = 255 * 255;

/// Sampling stride over the height field for a given LOD level.
///
/// LOD 0 samples every cell; LOD `n > 0` samples every `2n`-th cell.
#[inline]
pub fn skip_increment(lod: u8) -> usize {
    if lod == 0 { 1 } else { 2 * lod as usize }
}

/// Vertices along one axis of a mesh built at `lod` from a `size`-sample field.
#[inline]
pub fn vertices_per_line(size: usize, lod: u8) -> usize {
    (size - 1) / skip_increment(lod) + 1
}

/// One row of the LOD table: `lod` is used while the viewer is within
/// `visible_distance_threshold` of the chunk.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodDescriptor {
    pub lod: u8,
    pub visible_distance_threshold: f32,
}

impl LodDescriptor {
    pub const fn new(lod: u8, visible_distance_threshold: f32) -> Self {
        Self {
            lod,
            visible_distance_threshold,
        }
    }
}

/// Errors raised while validating an LOD table.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LodError {
    #[error("LOD table must contain at least one level")]
    Empty,

    #[error("LOD level {lod} exceeds the maximum of {MAX_LOD}")]
    LevelTooHigh { lod: u8 },

    #[error("LOD level {lod} appears more than once")]
    DuplicateLevel { lod: u8 },

    #[error("threshold {threshold} for LOD {lod} must be positive and finite")]
    InvalidThreshold { lod: u8, threshold: f32 },

    #[error("thresholds must be strictly increasing ({previous} then {threshold})")]
    NotIncreasing { previous: f32, threshold: f32 },

    #[error("chunk sample size must be at least 2, got {size}")]
    SampleSizeTooSmall { size: usize },

    #[error("stride {stride} of LOD {lod} does not divide chunk edge {edge}")]
    StrideMismatch { lod: u8, stride: usize, edge: usize },

    #[error("chunk sample size {size} needs {vertices} vertices, over the limit of {MAX_MESH_VERTICES}")]
    TooManyVertices { size: usize, vertices: usize },
}

/// A validated, ascending list of LOD descriptors.
///
/// The last descriptor's threshold is the maximum view distance.
#[derive(Clone, Debug, PartialEq)]
pub struct LodTable {
    levels: Vec<LodDescriptor>,
}

impl LodTable {
    /// Validate and wrap a list of descriptors.
    ///
    /// Requires at least one level, positive strictly increasing thresholds,
    /// unique levels, and every level at most [`MAX_LOD`].
    pub fn new(levels: Vec<LodDescriptor>) -> Result<Self, LodError> {
        if levels.is_empty() {
            return Err(LodError::Empty);
        }

        let mut previous: Option<f32> = None;
        for (i, level) in levels.iter().enumerate() {
            if level.lod > MAX_LOD {
                return Err(LodError::LevelTooHigh { lod: level.lod });
            }
            if levels[..i].iter().any(|l| l.lod == level.lod) {
                return Err(LodError::DuplicateLevel { lod: level.lod });
            }
            let threshold = level.visible_distance_threshold;
            if !(threshold.is_finite() && threshold > 0.0) {
                return Err(LodError::InvalidThreshold {
                    lod: level.lod,
                    threshold,
                });
            }
            if let Some(previous) = previous
                && threshold <= previous
            {
                return Err(LodError::NotIncreasing {
                    previous,
                    threshold,
                });
            }
            previous = Some(threshold);
        }

        Ok(Self { levels })
    }

    /// Defaults for a 240-unit chunk: full detail up to 200 units, LOD 6 out to 800.
    pub fn default_terrain() -> Self {
        Self {
            levels: vec![
                LodDescriptor::new(0, 200.0),
                LodDescriptor::new(1, 400.0),
                LodDescriptor::new(3, 600.0),
                LodDescriptor::new(6, 800.0),
            ],
        }
    }

    /// The descriptors, in ascending threshold order.
    pub fn levels(&self) -> &[LodDescriptor] {
        &self.levels
    }

    /// Furthest distance at which any chunk is visible.
    pub fn max_view_distance(&self) -> f32 {
        self.levels
            .last()
            .map_or(0.0, |l| l.visible_distance_threshold)
    }

    /// Pick the descriptor for a chunk `distance` units from the viewer.
    ///
    /// Returns the first descriptor whose threshold is at least `distance`,
    /// so a distance exactly on a threshold keeps the finer level. Distances
    /// past every threshold get the last (coarsest) descriptor.
    pub fn select(&self, distance: f32) -> &LodDescriptor {
        debug_assert!(distance >= 0.0, "distance must be non-negative");
        self.levels
            .iter()
            .find(|l| distance <= l.visible_distance_threshold)
            .unwrap_or(&self.levels[self.levels.len() - 1])
    }

    /// Check that every stride in the table tiles a `size`-sample field and
    /// that the finest mesh stays under [`MAX_MESH_VERTICES`].
    pub fn check_sample_size(&self, size: usize) -> Result<(), LodError> {
        if size < 2 {
            return Err(LodError::SampleSizeTooSmall { size });
        }
        self.levels
            .iter()
            .try_for_each(|level| check_level(size, level.lod))
    }
}

/// Check that a single `lod` can mesh a `size`-sample field: the level exists,
/// its stride divides the chunk edge and the mesh stays under
/// [`MAX_MESH_VERTICES`].
pub fn check_level(size: usize, lod: u8) -> Result<(), LodError> {
    if size < 2 {
        return Err(LodError::SampleSizeTooSmall { size });
    }
    if lod > MAX_LOD {
        return Err(LodError::LevelTooHigh { lod });
    }
    let edge = size - 1;
    let stride = skip_increment(lod);
    if edge % stride != 0 {
        return Err(LodError::StrideMismatch { lod, stride, edge });
    }
    let per_line = vertices_per_line(size, lod);
    let vertices = per_line * per_line;
    if vertices > MAX_MESH_VERTICES {
        return Err(LodError::TooManyVertices { size, vertices });
    }
    Ok(())
}

impl Default for LodTable {
    fn default() -> Self {
        Self::default_terrain()
    }
}
