use glam::{Vec2, Vec4};

use crate::errors::Result;
use crate::geometry::UvScaling;
use crate::stage::{AttributeHandle, PrimId, Stage, Value, ValueType};

pub const MATERIALS_SCOPE: &str = "/World/_materials";

const SURFACE_SHADER: &str = "Principled_BSDF";
const IMAGE_SHADER: &str = "Image_Texture";
const UV_READER_SHADER: &str = "uvmap";

/// Primvar holding the exported texture coordinates.
pub const UV_PRIMVAR: &str = "UVMap";

/// Appearance of one visual element.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualAttributes {
    pub rgba: Vec4,
    pub shininess: f32,
    pub texture_repeat: Vec2,
    pub texture_uniform: bool,
    pub texture_file: Option<String>,
}

impl Default for VisualAttributes {
    fn default() -> Self {
        Self {
            rgba: Vec4::ONE,
            shininess: 0.5,
            texture_repeat: Vec2::ONE,
            texture_uniform: false,
            texture_file: None,
        }
    }
}

impl VisualAttributes {
    pub fn solid(rgba: Vec4) -> Self {
        Self {
            rgba,
            ..Default::default()
        }
    }

    pub fn textured(texture_file: impl Into<String>) -> Self {
        Self {
            texture_file: Some(texture_file.into()),
            ..Default::default()
        }
    }

    pub fn uv_scaling(&self) -> UvScaling {
        UvScaling {
            repeat: self.texture_repeat,
            uniform: self.texture_uniform,
        }
    }
}

pub fn material_path(object_name: &str) -> String {
    format!("{MATERIALS_SCOPE}/Material_{object_name}")
}

struct ShaderNode {
    prim: PrimId,
}

impl ShaderNode {
    fn define(stage: &mut Stage, material_path: &str, name: &str, shader_id: &str) -> Result<Self> {
        let prim = stage.define_shader(&format!("{material_path}/{name}"))?;
        let id = stage.create_uniform_attribute(prim, "info:id", ValueType::Token)?;
        stage.set(&id, Value::token(shader_id))?;
        Ok(Self { prim })
    }

    fn input(
        &self,
        stage: &mut Stage,
        name: &str,
        value_type: ValueType,
    ) -> Result<AttributeHandle> {
        stage.create_attribute(self.prim, &format!("inputs:{name}"), value_type)
    }

    fn set_input(&self, stage: &mut Stage, name: &str, value: Value) -> Result<()> {
        let input = self.input(stage, name, value.value_type())?;
        stage.set(&input, value)
    }

    fn output(
        &self,
        stage: &mut Stage,
        name: &str,
        value_type: ValueType,
    ) -> Result<AttributeHandle> {
        stage.create_attribute(self.prim, &format!("outputs:{name}"), value_type)
    }
}

/// Surface shader inputs shared by both networks.
fn define_surface(
    stage: &mut Stage,
    material_path: &str,
    visual: &VisualAttributes,
) -> Result<ShaderNode> {
    let surface = ShaderNode::define(stage, material_path, SURFACE_SHADER, "UsdPreviewSurface")?;
    surface.set_input(stage, "opacity", Value::Float(visual.rgba.w))?;
    surface.set_input(stage, "metallic", Value::Float(visual.shininess))?;
    surface.set_input(stage, "roughness", Value::Float(1.0 - visual.shininess))?;
    Ok(surface)
}

fn build_textured_network(
    stage: &mut Stage,
    material_path: &str,
    visual: &VisualAttributes,
    texture_file: &str,
) -> Result<ShaderNode> {
    let surface = define_surface(stage, material_path, visual)?;
    let image = ShaderNode::define(stage, material_path, IMAGE_SHADER, "UsdUVTexture")?;
    let uv_reader = ShaderNode::define(
        stage,
        material_path,
        UV_READER_SHADER,
        "UsdPrimvarReader_float2",
    )?;

    let image_rgb = image.output(stage, "rgb", ValueType::Float3)?;
    let diffuse = surface.input(stage, "diffuseColor", ValueType::Color3f)?;
    stage.connect(&diffuse, &image_rgb)?;

    image.set_input(stage, "file", Value::Asset(texture_file.to_string()))?;
    image.set_input(stage, "sourceColorSpace", Value::token("sRGB"))?;
    image.set_input(stage, "wrapS", Value::token("repeat"))?;
    image.set_input(stage, "wrapT", Value::token("repeat"))?;

    let uv_result = uv_reader.output(stage, "result", ValueType::Float2)?;
    let st = image.input(stage, "st", ValueType::Float2)?;
    stage.connect(&st, &uv_result)?;

    uv_reader.set_input(stage, "varname", Value::token(UV_PRIMVAR))?;

    Ok(surface)
}

fn build_solid_network(
    stage: &mut Stage,
    material_path: &str,
    visual: &VisualAttributes,
) -> Result<ShaderNode> {
    let surface = define_surface(stage, material_path, visual)?;
    surface.set_input(stage, "diffuseColor", Value::Color3f(visual.rgba.truncate()))?;
    Ok(surface)
}

/// Builds the object's material and binds it to `mesh`.
///
/// Binding again under the same object name rebuilds the network from
/// scratch, so no shader from an earlier binding stays connected.
pub fn bind_material(
    stage: &mut Stage,
    mesh: PrimId,
    object_name: &str,
    visual: &VisualAttributes,
) -> Result<PrimId> {
    let material_path = material_path(object_name);
    let material = stage.define_material(&material_path)?;

    let detached = stage.detach_children(material)?;
    if detached > 0 {
        log::trace!("Rebuilding {material_path} ({detached} shaders replaced)");
    }

    let surface = match &visual.texture_file {
        Some(texture_file) => build_textured_network(stage, &material_path, visual, texture_file)?,
        None => build_solid_network(stage, &material_path, visual)?,
    };

    let shader_surface = surface.output(stage, "surface", ValueType::Token)?;
    let material_surface = stage.create_attribute(material, "outputs:surface", ValueType::Token)?;
    stage.connect(&material_surface, &shader_surface)?;

    stage.apply_api_schema(mesh, "MaterialBindingAPI")?;
    stage.set_relationship(mesh, "material:binding", vec![material_path.clone()])?;

    log::debug!("Bound {material_path}");

    Ok(material)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn stage_with_mesh() -> (Stage, PrimId) {
        let mut stage = Stage::new();
        let mesh = stage
            .define_mesh("/World/Mesh_Xform_crate/Mesh_crate")
            .unwrap();
        (stage, mesh)
    }

    fn shader_names(stage: &Stage, material: PrimId) -> Vec<String> {
        stage
            .children(material)
            .map(|shader| shader.name.clone())
            .collect()
    }

    #[test]
    fn solid_material_has_a_single_surface_shader() {
        let (mut stage, mesh) = stage_with_mesh();
        let visual = VisualAttributes {
            rgba: Vec4::new(1.0, 0.0, 0.0, 0.25),
            shininess: 0.75,
            ..Default::default()
        };
        let material = bind_material(&mut stage, mesh, "crate", &visual).unwrap();

        assert_eq!(shader_names(&stage, material), vec!["Principled_BSDF"]);

        let surface = "/World/_materials/Material_crate/Principled_BSDF";
        let input = |name: &str| stage.attribute_at(surface, name).unwrap().default_value();
        assert_eq!(
            input("inputs:diffuseColor"),
            Some(&Value::Color3f(Vec3::new(1.0, 0.0, 0.0)))
        );
        assert_eq!(input("inputs:opacity"), Some(&Value::Float(0.25)));
        assert_eq!(input("inputs:metallic"), Some(&Value::Float(0.75)));
        assert_eq!(input("inputs:roughness"), Some(&Value::Float(0.25)));
    }

    #[test]
    fn textured_material_wires_uvs_through_the_image() {
        let (mut stage, mesh) = stage_with_mesh();
        let material =
            bind_material(&mut stage, mesh, "crate", &VisualAttributes::textured("wood.png"))
                .unwrap();

        assert_eq!(
            shader_names(&stage, material),
            vec!["Principled_BSDF", "Image_Texture", "uvmap"]
        );

        let base = "/World/_materials/Material_crate";
        let connection = |prim: &str, name: &str| {
            stage
                .attribute_at(&format!("{base}/{prim}"), name)
                .and_then(|attribute| attribute.connection.clone())
        };
        assert_eq!(
            connection("Principled_BSDF", "inputs:diffuseColor"),
            Some(format!("{base}/Image_Texture.outputs:rgb"))
        );
        assert_eq!(
            connection("Image_Texture", "inputs:st"),
            Some(format!("{base}/uvmap.outputs:result"))
        );
        assert_eq!(
            stage
                .attribute_at(base, "outputs:surface")
                .and_then(|attribute| attribute.connection.clone()),
            Some(format!("{base}/Principled_BSDF.outputs:surface"))
        );
        assert_eq!(
            stage
                .attribute_at(&format!("{base}/Image_Texture"), "inputs:file")
                .and_then(|attribute| attribute.default_value()),
            Some(&Value::Asset("wood.png".to_string()))
        );
    }

    #[test]
    fn rebinding_replaces_the_previous_network() {
        let (mut stage, mesh) = stage_with_mesh();
        bind_material(&mut stage, mesh, "crate", &VisualAttributes::textured("wood.png")).unwrap();
        let material = bind_material(&mut stage, mesh, "crate", &VisualAttributes::default()).unwrap();

        assert_eq!(shader_names(&stage, material), vec!["Principled_BSDF"]);
        assert!(stage
            .prim_at_path("/World/_materials/Material_crate/Image_Texture")
            .is_none());

        let surface = "/World/_materials/Material_crate/Principled_BSDF";
        let diffuse = stage.attribute_at(surface, "inputs:diffuseColor").unwrap();
        assert_eq!(diffuse.connection, None);

        let mesh_prim = stage.prim(mesh).unwrap();
        assert_eq!(
            mesh_prim.relationship("material:binding"),
            Some(&["/World/_materials/Material_crate".to_string()][..])
        );
        assert_eq!(mesh_prim.api_schemas, vec!["MaterialBindingAPI"]);
    }
}
