//! Level-of-detail management: LOD descriptors, distance-based selection, and sampling strides.

mod bounds;
mod selector;

pub use bounds::ChunkBounds;
pub use selector::{
    LodDescriptor, LodError, LodTable, MAX_LOD, MAX_MESH_VERTICES, check_level, skip_increment,
    vertices_per_line,
};
