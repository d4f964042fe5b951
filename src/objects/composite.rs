use std::collections::HashSet;

use glam::{Vec2, Vec3};

use crate::errors::{ExportError, Result};
use crate::geometry::primitive::{build_primitive, into_geometry};
use crate::geometry::shapes::NamedShape;
use crate::geometry::TessellationOptions;
use crate::materials::{bind_material, VisualAttributes};
use crate::objects::base::{
    author_mesh, disable_subdivision, mesh_path, update_base, ObjectNode, ObjectPose, SceneObject,
};
use crate::stage::{is_valid_identifier, AttributeHandle, PrimId, Stage, Value, XformOp};

/// Where a part sits relative to the body, decided from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartRole {
    /// Cap at the negative end of the body.
    Leading,
    /// Cap at the positive end of the body.
    Trailing,
    /// The body itself.
    Central,
    Other,
}

impl PartRole {
    pub fn from_part_name(name: &str) -> Self {
        if name.contains("left") {
            PartRole::Leading
        } else if name.contains("right") {
            PartRole::Trailing
        } else if name.contains("cylinder") {
            PartRole::Central
        } else {
            PartRole::Other
        }
    }

    /// Translation that keeps a cap flush with the end of a body scaled by
    /// `scale`. `None` for parts that do not move.
    pub fn end_offset(self, scale: Vec3) -> Option<Vec3> {
        let distance = scale.z + scale.x / 2.0;
        match self {
            PartRole::Leading => Some(Vec3::new(0.0, 0.0, -distance)),
            PartRole::Trailing => Some(Vec3::new(0.0, 0.0, distance)),
            PartRole::Central | PartRole::Other => None,
        }
    }
}

/// Only body parts stretch along Z. The check is separate from the role, so
/// a `left_cylinder` is offset like a cap but scaled like a body.
pub fn stretches_with_body(part_name: &str) -> bool {
    part_name.contains("cylinder")
}

#[derive(Debug, Clone)]
pub struct CompositePart {
    pub name: String,
    pub role: PartRole,
    pub stretches: bool,
    pub xform: PrimId,
    pub mesh: PrimId,
    pub translate_op: AttributeHandle,
    pub scale_op: AttributeHandle,
}

/// Parts sit in their own xforms under the object's xform, whose scale op is
/// never sampled.
pub struct CompositeObject {
    node: ObjectNode,
    parts: Vec<CompositePart>,
    last_scale: Vec3,
}

impl CompositePart {
    /// Radial parts keep `scale.x` along Z so their cross-section stays round.
    pub fn scale_for(&self, scale: Vec3) -> Vec3 {
        if self.stretches {
            scale
        } else {
            Vec3::new(scale.x, scale.y, scale.x)
        }
    }
}

impl CompositeObject {
    pub fn new(
        stage: &mut Stage,
        name: &str,
        parts: &[NamedShape],
        visual: &VisualAttributes,
        options: &TessellationOptions,
    ) -> Result<Self> {
        if parts.is_empty() {
            return Err(ExportError::EmptyComposite(name.to_string()));
        }

        if let Some(invalid) = parts.iter().find(|part| !is_valid_identifier(&part.name)) {
            return Err(ExportError::InvalidPath(format!("{name}/{}", invalid.name)));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = parts.iter().find(|part| !seen.insert(part.name.as_str())) {
            return Err(ExportError::DuplicateObjectName(format!(
                "{name}/{}",
                duplicate.name
            )));
        }

        // Part UVs keep their intrinsic parameterisation; texture repeat is
        // not applied to composites.
        let geometries = parts
            .iter()
            .map(|part| {
                let (part_name, mesh) = build_primitive(part, options)?;
                Ok((part_name, into_geometry(mesh, Vec2::ONE)))
            })
            .collect::<Result<Vec<_>>>()?;

        let node = ObjectNode::define(stage, name)?;
        let object_path = node.path();

        let mut built_parts = Vec::with_capacity(geometries.len());
        for (part_name, geometry) in geometries {
            let part_path = format!("{object_path}/Mesh_Xform_{part_name}");
            let xform = stage.define_xform(&part_path)?;
            let translate_op = stage.add_xform_op(xform, XformOp::Translate)?;
            let scale_op = stage.add_xform_op(xform, XformOp::Scale)?;

            let mesh = stage.define_mesh(&mesh_path(&part_path, name))?;
            author_mesh(stage, mesh, &geometry)?;
            disable_subdivision(stage, mesh)?;

            // All parts share the object's material
            bind_material(stage, mesh, name, visual)?;

            built_parts.push(CompositePart {
                role: PartRole::from_part_name(&part_name),
                stretches: stretches_with_body(&part_name),
                name: part_name,
                xform,
                mesh,
                translate_op,
                scale_op,
            });
        }

        log::debug!(
            "Created composite {name} with parts {:?}",
            built_parts
                .iter()
                .map(|part| part.name.as_str())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            node,
            parts: built_parts,
            last_scale: Vec3::ONE,
        })
    }

    pub fn parts(&self) -> &[CompositePart] {
        &self.parts
    }

    pub fn part(&self, name: &str) -> Option<&CompositePart> {
        self.parts.iter().find(|part| part.name == name)
    }
}

impl SceneObject for CompositeObject {
    fn node(&self) -> &ObjectNode {
        &self.node
    }

    fn node_mut(&mut self) -> &mut ObjectNode {
        &mut self.node
    }

    fn kind(&self) -> &'static str {
        "composite"
    }

    fn update(&mut self, stage: &mut Stage, pose: &ObjectPose, frame: u32) -> Result<()> {
        update_base(self, stage, pose, frame)?;

        let scale = pose.scale.unwrap_or(self.last_scale);
        for part in &self.parts {
            if let Some(offset) = part.role.end_offset(scale) {
                stage.set_sample(&part.translate_op, Value::Float3(offset), f64::from(frame))?;
            }
        }

        Ok(())
    }

    fn update_scale(&mut self, stage: &mut Stage, scale: Vec3, frame: u32) -> Result<()> {
        for part in &self.parts {
            stage.set_sample(
                &part.scale_op,
                Value::Float3(part.scale_for(scale)),
                f64::from(frame),
            )?;
        }

        self.last_scale = scale;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat3;

    use super::*;
    use crate::geometry::shapes::{capsule_parts, CapDirection};
    use crate::geometry::ShapeDescriptor;

    fn capsule(stage: &mut Stage) -> CompositeObject {
        CompositeObject::new(
            stage,
            "rope",
            &capsule_parts(0.1, 0.5),
            &VisualAttributes::default(),
            &TessellationOptions { resolution: 4 },
        )
        .unwrap()
    }

    fn sample(stage: &Stage, path: &str, attribute: &str, frame: f64) -> Option<Vec3> {
        stage
            .attribute_at(path, attribute)?
            .value_at(frame)?
            .as_float3()
    }

    #[test]
    fn roles_follow_part_names() {
        assert_eq!(PartRole::from_part_name("left_hemisphere"), PartRole::Leading);
        assert_eq!(PartRole::from_part_name("right_hemisphere"), PartRole::Trailing);
        assert_eq!(PartRole::from_part_name("cylinder"), PartRole::Central);
        assert_eq!(PartRole::from_part_name("box"), PartRole::Other);
    }

    #[test]
    fn named_body_caps_are_offset_but_stretched() {
        let mut stage = Stage::new();
        let parts = [
            ShapeDescriptor::Cylinder {
                radius: 0.1,
                height: 1.0,
            }
            .named("left_cylinder"),
            ShapeDescriptor::Hemisphere {
                radius: 0.1,
                direction: CapDirection::PositiveZ,
            }
            .named("right_hemisphere"),
        ];
        let mut rod = CompositeObject::new(
            &mut stage,
            "rod",
            &parts,
            &VisualAttributes::default(),
            &TessellationOptions { resolution: 4 },
        )
        .unwrap();

        let left = rod.part("left_cylinder").unwrap();
        assert_eq!(left.role, PartRole::Leading);
        assert!(left.stretches);
        assert!(!rod.part("right_hemisphere").unwrap().stretches);

        let pose = ObjectPose::new(Vec3::ZERO, Mat3::IDENTITY).with_scale(Vec3::new(2.0, 3.0, 4.0));
        rod.update(&mut stage, &pose, 0).unwrap();

        let left_path = "/World/Mesh_Xform_rod/Mesh_Xform_left_cylinder";
        assert_eq!(
            sample(&stage, left_path, "xformOp:scale", 0.0),
            Some(Vec3::new(2.0, 3.0, 4.0))
        );
        assert_eq!(
            sample(&stage, left_path, "xformOp:translate", 0.0),
            Some(Vec3::new(0.0, 0.0, -5.0))
        );
        assert_eq!(
            sample(
                &stage,
                "/World/Mesh_Xform_rod/Mesh_Xform_right_hemisphere",
                "xformOp:scale",
                0.0
            ),
            Some(Vec3::new(2.0, 3.0, 2.0))
        );
    }

    #[test]
    fn parts_get_their_own_xforms() {
        let mut stage = Stage::new();
        let rope = capsule(&mut stage);

        let names: Vec<_> = rope.parts().iter().map(|part| part.name.as_str()).collect();
        assert_eq!(names, vec!["cylinder", "left_hemisphere", "right_hemisphere"]);

        for part in ["cylinder", "left_hemisphere", "right_hemisphere"] {
            let xform_path = format!("/World/Mesh_Xform_rope/Mesh_Xform_{part}");
            let xform = stage.prim_at_path(&xform_path).unwrap();
            assert_eq!(
                stage.prim(xform).unwrap().xform_op_order(),
                vec!["xformOp:translate", "xformOp:scale"]
            );
            assert!(stage
                .prim_at_path(&format!("{xform_path}/Mesh_rope"))
                .is_some());
        }
    }

    #[test]
    fn caps_sit_at_the_ends_of_the_stretched_body() {
        let mut stage = Stage::new();
        let mut rope = capsule(&mut stage);
        let pose = ObjectPose::new(Vec3::ZERO, Mat3::IDENTITY).with_scale(Vec3::new(1.0, 1.0, 4.0));
        rope.update(&mut stage, &pose, 0).unwrap();

        let base = "/World/Mesh_Xform_rope";
        assert_eq!(
            sample(&stage, &format!("{base}/Mesh_Xform_left_hemisphere"), "xformOp:translate", 0.0),
            Some(Vec3::new(0.0, 0.0, -4.5))
        );
        assert_eq!(
            sample(&stage, &format!("{base}/Mesh_Xform_right_hemisphere"), "xformOp:translate", 0.0),
            Some(Vec3::new(0.0, 0.0, 4.5))
        );
        assert!(stage
            .attribute_at(&format!("{base}/Mesh_Xform_cylinder"), "xformOp:translate")
            .map_or(false, |attribute| !attribute.is_time_sampled()));
    }

    #[test]
    fn caps_keep_radial_scale() {
        let mut stage = Stage::new();
        let mut rope = capsule(&mut stage);
        let pose = ObjectPose::new(Vec3::ZERO, Mat3::IDENTITY).with_scale(Vec3::new(2.0, 3.0, 4.0));
        rope.update(&mut stage, &pose, 3).unwrap();

        let base = "/World/Mesh_Xform_rope";
        assert_eq!(
            sample(&stage, &format!("{base}/Mesh_Xform_cylinder"), "xformOp:scale", 3.0),
            Some(Vec3::new(2.0, 3.0, 4.0))
        );
        assert_eq!(
            sample(&stage, &format!("{base}/Mesh_Xform_left_hemisphere"), "xformOp:scale", 3.0),
            Some(Vec3::new(2.0, 3.0, 2.0))
        );
        assert!(!stage
            .attribute_at(base, "xformOp:scale")
            .unwrap()
            .is_time_sampled());
    }

    #[test]
    fn update_without_scale_reuses_the_last_one() {
        let mut stage = Stage::new();
        let mut rope = capsule(&mut stage);
        let pose = ObjectPose::new(Vec3::ZERO, Mat3::IDENTITY);

        rope.update(&mut stage, &pose, 0).unwrap();
        rope.update(&mut stage, &pose.with_scale(Vec3::new(1.0, 1.0, 2.0)), 1)
            .unwrap();
        rope.update(&mut stage, &pose, 2).unwrap();

        let right = "/World/Mesh_Xform_rope/Mesh_Xform_right_hemisphere";
        assert_eq!(
            sample(&stage, right, "xformOp:translate", 0.0),
            Some(Vec3::new(0.0, 0.0, 1.5))
        );
        assert_eq!(
            sample(&stage, right, "xformOp:translate", 2.0),
            Some(Vec3::new(0.0, 0.0, 2.5))
        );
    }

    #[test]
    fn empty_and_duplicate_parts_are_rejected() {
        let mut stage = Stage::new();
        let options = TessellationOptions::default();
        let visual = VisualAttributes::default();

        assert!(matches!(
            CompositeObject::new(&mut stage, "empty", &[], &visual, &options),
            Err(ExportError::EmptyComposite(_))
        ));

        let part = ShapeDescriptor::Sphere { radius: 1.0 }.named("ball");
        assert!(matches!(
            CompositeObject::new(&mut stage, "twins", &[part.clone(), part], &visual, &options),
            Err(ExportError::DuplicateObjectName(_))
        ));
        assert!(stage.root_ids().is_empty());
    }
}
