pub mod gltf_import;
pub mod mesh_arena;

pub use mesh_arena::{MeshArrays, MeshAssetArena};
