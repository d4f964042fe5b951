pub mod mesh;
pub mod primitive;
pub mod shapes;

pub use mesh::{GeometrySlice, TriangleMesh};
pub use primitive::UvScaling;
pub use shapes::{NamedShape, ShapeDescriptor, TessellationOptions};
