//! Mesh buffers produced by the terrain mesh builder.

use glam::{Vec2, Vec3};

static_assertions::assert_eq_size!(Vec3, [f32; 3]);
static_assertions::assert_eq_size!(Vec2, [f32; 2]);

/// Vertex positions, UVs, and triangle indices for one chunk at one LOD.
///
/// Contains tightly packed buffers ready for GPU upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// LOD level the mesh was built at.
    pub lod: u8,
    /// Vertices along each axis of the grid.
    pub vertices_per_line: usize,
    /// Vertex positions in chunk-local space, centred on the chunk.
    pub positions: Vec<Vec3>,
    /// Texture coordinates, one per vertex.
    pub uvs: Vec<Vec2>,
    /// Index buffer (triangles, 3 indices per triangle).
    pub indices: Vec<u32>,
}

impl MeshData {
    /// An empty mesh with buffers sized for a `vertices_per_line` square grid.
    pub fn with_grid_capacity(lod: u8, vertices_per_line: usize) -> Self {
        let vertices = vertices_per_line * vertices_per_line;
        let quads = vertices_per_line.saturating_sub(1).pow(2);
        Self {
            lod,
            vertices_per_line,
            positions: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(quads * 6),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn push_vertex(&mut self, position: Vec3, uv: Vec2) {
        self.positions.push(position);
        self.uvs.push(uv);
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Iterate triangles as index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Position buffer as raw bytes.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Index buffer as raw bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Returns `true` if any triangle repeats a vertex index.
    pub fn has_degenerate_triangles(&self) -> bool {
        self.triangles()
            .any(|[a, b, c]| a == b || b == c || a == c)
    }

    /// Smooth per-vertex normals: the normalized sum of the (area-weighted)
    /// normals of every triangle touching the vertex.
    pub fn compute_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for [a, b, c] in self.triangles() {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            let face = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        normals.iter_mut().for_each(|n| *n = n.normalize_or_zero());
        normals
    }
}
