//! Axis-aligned square bounds of a chunk on the ground plane.

use glam::Vec2;

/// Square footprint of a chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkBounds {
    pub centre: Vec2,
    pub half_extent: f32,
}

impl ChunkBounds {
    /// Bounds of a chunk centred at `centre` with side length `edge`.
    pub fn new(centre: Vec2, edge: f32) -> Self {
        Self {
            centre,
            half_extent: edge * 0.5,
        }
    }

    /// Squared distance from `point` to the nearest point of the bounds.
    /// Zero when `point` lies inside.
    pub fn sq_distance_to(&self, point: Vec2) -> f32 {
        let d = ((point - self.centre).abs() - Vec2::splat(self.half_extent)).max(Vec2::ZERO);
        d.length_squared()
    }

    /// Distance from `point` to the nearest point of the bounds.
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.sq_distance_to(point).sqrt()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.sq_distance_to(point) == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_chunk() -> ChunkBounds {
        ChunkBounds::new(Vec2::ZERO, 240.0)
    }

    #[test]
    fn test_inside_is_zero() {
        let b = unit_chunk();
        assert_eq!(b.sq_distance_to(Vec2::new(10.0, -100.0)), 0.0);
        assert!(b.contains(Vec2::new(120.0, 120.0)));
    }

    #[test]
    fn test_distance_along_axis() {
        let b = unit_chunk();
        assert_eq!(b.distance_to(Vec2::new(420.0, 0.0)), 300.0);
        assert_eq!(b.distance_to(Vec2::new(0.0, -130.0)), 10.0);
    }

    #[test]
    fn test_distance_to_corner() {
        let b = unit_chunk();
        // 3-4-5 triangle from the (120, 120) corner.
        assert_eq!(b.sq_distance_to(Vec2::new(150.0, 160.0)), 2500.0);
        assert_eq!(b.distance_to(Vec2::new(150.0, 160.0)), 50.0);
    }

    #[test]
    fn test_offset_centre() {
        let b = ChunkBounds::new(Vec2::new(480.0, 240.0), 240.0);
        assert_eq!(b.distance_to(Vec2::new(480.0, 0.0)), 120.0);
    }
}
