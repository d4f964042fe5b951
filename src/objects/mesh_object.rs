use crate::asset_pipeline::MeshAssetArena;
use crate::errors::Result;
use crate::materials::{bind_material, VisualAttributes};
use crate::objects::base::{author_mesh, mesh_path, ObjectNode, SceneObject};
use crate::stage::{PrimId, Stage};

/// An object whose geometry is one asset of the mesh arena.
pub struct MeshObject {
    node: ObjectNode,
    pub mesh: PrimId,
    pub asset_id: usize,
}

impl MeshObject {
    pub fn new(
        stage: &mut Stage,
        arena: &MeshAssetArena,
        name: &str,
        asset_id: usize,
        visual: &VisualAttributes,
    ) -> Result<Self> {
        // Resolved before anything is defined so a bad asset id leaves the stage untouched
        let geometry = arena.slice(asset_id)?;

        let node = ObjectNode::define(stage, name)?;
        let mesh = stage.define_mesh(&mesh_path(&node.path(), name))?;
        author_mesh(stage, mesh, &geometry)?;
        bind_material(stage, mesh, name, visual)?;

        log::debug!(
            "Created mesh object {name} from asset {asset_id} ({} faces)",
            geometry.face_count()
        );

        Ok(Self {
            node,
            mesh,
            asset_id,
        })
    }
}

impl SceneObject for MeshObject {
    fn node(&self) -> &ObjectNode {
        &self.node
    }

    fn node_mut(&mut self) -> &mut ObjectNode {
        &mut self.node
    }

    fn kind(&self) -> &'static str {
        "mesh"
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;
    use crate::errors::ExportError;
    use crate::geometry::GeometrySlice;
    use crate::stage::Value;

    fn arena() -> MeshAssetArena {
        let quad = GeometrySlice {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            faces: vec![[0, 1, 2], [0, 2, 3]],
            uv_coords: vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y],
            face_uv_indices: vec![0, 1, 2, 0, 2, 4],
        };
        MeshAssetArena::bake(&[quad]).unwrap()
    }

    #[test]
    fn mesh_object_authors_the_asset_slice() {
        let mut stage = Stage::new();
        let object =
            MeshObject::new(&mut stage, &arena(), "quad", 0, &VisualAttributes::default()).unwrap();

        assert_eq!(
            stage.path_of(object.mesh),
            Some("/World/Mesh_Xform_quad/Mesh_quad")
        );
        let attribute = |name: &str| {
            stage
                .attribute_at("/World/Mesh_Xform_quad/Mesh_quad", name)
                .and_then(|attribute| attribute.default_value())
                .cloned()
        };
        assert_eq!(
            attribute("faceVertexIndices"),
            Some(Value::IntArray(vec![0, 1, 2, 0, 2, 3]))
        );
        assert_eq!(
            attribute("primvars:UVMap:indices"),
            Some(Value::IntArray(vec![0, 1, 2, 0, 2, 0]))
        );
        assert_eq!(attribute("subdivisionScheme"), None);
    }

    #[test]
    fn invalid_asset_defines_nothing() {
        let mut stage = Stage::new();
        let result = MeshObject::new(&mut stage, &arena(), "ghost", 3, &VisualAttributes::default());

        assert!(matches!(
            result,
            Err(ExportError::InvalidAssetId {
                asset_id: 3,
                asset_count: 1
            })
        ));
        assert!(stage.root_ids().is_empty());
    }
}
