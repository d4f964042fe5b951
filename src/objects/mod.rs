pub mod base;
pub mod composite;
pub mod mesh_object;
pub mod primitive_object;

pub use base::{
    object_xform_path, update_base, ObjectNode, ObjectPose, SceneObject, VisibilityGap,
    VisibilityState, VisibilityTracker,
};
pub use composite::{CompositeObject, CompositePart, PartRole};
pub use mesh_object::MeshObject;
pub use primitive_object::PrimitiveObject;
