//! Terrain meshing: LOD grid meshes from height fields, height curves, and mesh buffers.

pub mod height_curve;
pub mod lod_mesh;
pub mod mesh_data;

pub use height_curve::{CurveKey, HeightCurve, KeyframeCurve};
pub use lod_mesh::build_terrain_mesh;
pub use mesh_data::MeshData;
