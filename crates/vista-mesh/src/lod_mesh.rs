//! LOD-aware grid meshing: generates a terrain mesh from a height field by
//! sampling every `stride`-th cell.
//!
//! At LOD 0 every sample becomes a vertex. At LOD `n > 0` only every `2n`-th
//! sample along each axis is kept, so a 241-sample field gives 241, 121, 61,
//! 41, 31, 25 or 21 vertices per line. The mesh always covers the same
//! footprint, centred on the chunk origin, with row 0 on the +Z edge.

use glam::{Vec2, Vec3};
use vista_lod::{MAX_MESH_VERTICES, skip_increment, vertices_per_line};
use vista_terrain::{CHUNK_SAMPLE_SIZE, HeightField};

use crate::height_curve::HeightCurve;
use crate::mesh_data::MeshData;

static_assertions::const_assert!(CHUNK_SAMPLE_SIZE * CHUNK_SAMPLE_SIZE <= MAX_MESH_VERTICES);

/// Build the mesh for `field` at `lod`.
///
/// Vertex elevation is `curve(height) * height_multiplier`. UVs run from 0 to
/// 1 across the chunk. Each grid square is split into two triangles wound
/// counter-clockwise when seen from +Y, so face normals point up.
///
/// Pure: the same inputs always give the same mesh, and different LODs of
/// one field may be built concurrently.
pub fn build_terrain_mesh(
    field: &HeightField,
    height_multiplier: f32,
    curve: &dyn HeightCurve,
    lod: u8,
) -> MeshData {
    let size = field.size();
    let stride = skip_increment(lod);
    let per_line = vertices_per_line(size, lod);
    let extent = (size - 1) as f32;

    let top_left_x = extent / -2.0;
    let top_left_z = extent / 2.0;

    let mut mesh = MeshData::with_grid_capacity(lod, per_line);

    for row in 0..per_line {
        let y = row * stride;
        for col in 0..per_line {
            let x = col * stride;

            let elevation = curve.evaluate(field.get(x, y)) * height_multiplier;
            mesh.push_vertex(
                Vec3::new(top_left_x + x as f32, elevation, top_left_z - y as f32),
                Vec2::new(x as f32 / extent, y as f32 / extent),
            );

            if col + 1 < per_line && row + 1 < per_line {
                let i = (row * per_line + col) as u32;
                let line = per_line as u32;
                mesh.push_triangle(i, i + line + 1, i + line);
                mesh.push_triangle(i + line + 1, i, i + 1);
            }
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::height_curve::KeyframeCurve;
    use std::sync::Arc;
    use vista_lod::MAX_LOD;
    use vista_terrain::{NoiseParameters, NormalizeMode, generate_height_field};

    fn scenario_field() -> HeightField {
        let params = NoiseParameters {
            seed: 1,
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            normalize_mode: NormalizeMode::Local,
            ..Default::default()
        };
        generate_height_field(&params, CHUNK_SAMPLE_SIZE)
    }

    fn flat(size: usize) -> HeightField {
        HeightField::flat(size, 0.5)
    }

    #[test]
    fn test_scenario_lod_0_full_resolution() {
        let mesh = build_terrain_mesh(&scenario_field(), 10.0, &KeyframeCurve::linear(), 0);
        assert_eq!(mesh.vertices_per_line, 241);
        assert_eq!(mesh.vertex_count(), 241 * 241);
        assert_eq!(mesh.triangle_count(), 240 * 240 * 2);
    }

    #[test]
    fn test_scenario_lod_6_stride_12() {
        let mesh = build_terrain_mesh(&scenario_field(), 10.0, &KeyframeCurve::linear(), 6);
        assert_eq!(mesh.vertices_per_line, 21);
        assert_eq!(mesh.vertex_count(), 21 * 21);
        assert_eq!(mesh.triangle_count(), 20 * 20 * 2);
    }

    /// Per-axis vertex count is `floor(240 / stride) + 1` at every LOD.
    #[test]
    fn test_vertex_count_scales_with_stride() {
        let field = flat(CHUNK_SAMPLE_SIZE);
        let curve = KeyframeCurve::linear();
        for lod in 0..=MAX_LOD {
            let mesh = build_terrain_mesh(&field, 1.0, &curve, lod);
            let expected = 240 / skip_increment(lod) + 1;
            assert_eq!(mesh.vertices_per_line, expected, "lod {lod}");
            assert_eq!(mesh.vertex_count(), expected * expected, "lod {lod}");
            assert_eq!(
                mesh.triangle_count(),
                (expected - 1) * (expected - 1) * 2,
                "lod {lod}"
            );
        }
    }

    #[test]
    fn test_triangles_face_up() {
        let mesh = build_terrain_mesh(&flat(25), 1.0, &KeyframeCurve::linear(), 2);
        for [a, b, c] in mesh.triangles() {
            let (pa, pb, pc) = (
                mesh.positions[a as usize],
                mesh.positions[b as usize],
                mesh.positions[c as usize],
            );
            let normal = (pb - pa).cross(pc - pa);
            assert!(normal.y > 0.0, "triangle {a},{b},{c} faces down: {normal}");
        }
    }

    #[test]
    fn test_mesh_valid_at_all_lod_levels() {
        let field = scenario_field();
        let curve = KeyframeCurve::linear();
        for lod in 0..=MAX_LOD {
            let mesh = build_terrain_mesh(&field, 5.0, &curve, lod);
            assert!(!mesh.has_degenerate_triangles(), "lod {lod}");
            let count = mesh.vertex_count() as u32;
            assert!(mesh.indices.iter().all(|&i| i < count), "lod {lod}");
        }
    }

    #[test]
    fn test_mesh_is_centred_and_spans_chunk() {
        let mesh = build_terrain_mesh(&flat(241), 1.0, &KeyframeCurve::linear(), 4);
        let first = mesh.positions[0];
        let last = mesh.positions[mesh.vertex_count() - 1];
        assert_eq!((first.x, first.z), (-120.0, 120.0));
        assert_eq!((last.x, last.z), (120.0, -120.0));
        assert_eq!(mesh.uvs[0], Vec2::ZERO);
        assert_eq!(mesh.uvs[mesh.vertex_count() - 1], Vec2::ONE);
    }

    #[test]
    fn test_elevation_uses_curve_and_multiplier() {
        let field = HeightField::new(3, vec![0.0, 0.2, 0.4, 0.5, 0.6, 0.8, 1.0, 0.1, 0.3]);
        let curve = KeyframeCurve::flat_below(0.5);
        let mesh = build_terrain_mesh(&field, 20.0, &curve, 0);

        for (i, p) in mesh.positions.iter().enumerate() {
            let h = field.values()[i];
            let expected = curve.evaluate(h) * 20.0;
            assert!((p.y - expected).abs() < 1e-5, "vertex {i}: {} vs {expected}", p.y);
        }
        assert_eq!(mesh.positions[6].y, 20.0);
        assert_eq!(mesh.positions[0].y, 0.0);
    }

    #[test]
    fn test_closure_curve_is_accepted() {
        let mesh = build_terrain_mesh(&flat(5), 2.0, &|t: f32| t + 1.0, 0);
        assert!(mesh.positions.iter().all(|p| p.y == 3.0));
    }

    #[test]
    fn test_builder_is_deterministic() {
        let field = scenario_field();
        let curve = KeyframeCurve::flat_below(0.3);
        assert_eq!(
            build_terrain_mesh(&field, 30.0, &curve, 1),
            build_terrain_mesh(&field, 30.0, &curve, 1)
        );
    }

    #[test]
    fn test_concurrent_builds_of_one_field() {
        let field = Arc::new(scenario_field());
        let curve: Arc<dyn HeightCurve> = Arc::new(KeyframeCurve::linear());

        let handles: Vec<_> = (0..=MAX_LOD)
            .map(|lod| {
                let field = Arc::clone(&field);
                let curve = Arc::clone(&curve);
                std::thread::spawn(move || build_terrain_mesh(&field, 8.0, curve.as_ref(), lod))
            })
            .collect();

        for (lod, handle) in handles.into_iter().enumerate() {
            let threaded = handle.join().unwrap();
            let local = build_terrain_mesh(&field, 8.0, curve.as_ref(), lod as u8);
            assert_eq!(threaded, local, "lod {lod}");
        }
    }
}
