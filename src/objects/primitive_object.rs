use crate::errors::Result;
use crate::geometry::primitive::primitive_geometry;
use crate::geometry::{ShapeDescriptor, TessellationOptions};
use crate::materials::{bind_material, VisualAttributes};
use crate::objects::base::{author_mesh, disable_subdivision, mesh_path, ObjectNode, SceneObject};
use crate::stage::{PrimId, Stage};

/// An object tessellated from a procedural shape.
pub struct PrimitiveObject {
    node: ObjectNode,
    pub mesh: PrimId,
    pub shape: ShapeDescriptor,
}

impl PrimitiveObject {
    pub fn new(
        stage: &mut Stage,
        name: &str,
        shape: ShapeDescriptor,
        visual: &VisualAttributes,
        options: &TessellationOptions,
    ) -> Result<Self> {
        let geometry = primitive_geometry(&shape, visual.uv_scaling(), options)?;

        let node = ObjectNode::define(stage, name)?;
        let mesh = stage.define_mesh(&mesh_path(&node.path(), name))?;
        author_mesh(stage, mesh, &geometry)?;
        disable_subdivision(stage, mesh)?;
        bind_material(stage, mesh, name, visual)?;

        log::debug!(
            "Created {} primitive {name} ({} faces)",
            shape.kind_name(),
            geometry.face_count()
        );

        Ok(Self { node, mesh, shape })
    }
}

impl SceneObject for PrimitiveObject {
    fn node(&self) -> &ObjectNode {
        &self.node
    }

    fn node_mut(&mut self) -> &mut ObjectNode {
        &mut self.node
    }

    fn kind(&self) -> &'static str {
        "primitive"
    }
}
