use glam::Vec2;

use crate::errors::Result;
use crate::geometry::mesh::{GeometrySlice, TriangleMesh};
use crate::geometry::shapes::{self, NamedShape, ShapeDescriptor, TessellationOptions};

/// Texture placement settings taken from an object's visual attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvScaling {
    pub repeat: Vec2,
    pub uniform: bool,
}

impl Default for UvScaling {
    fn default() -> Self {
        Self {
            repeat: Vec2::ONE,
            uniform: false,
        }
    }
}

impl UvScaling {
    pub fn factor(&self, shape: &ShapeDescriptor) -> Vec2 {
        if self.uniform {
            self.repeat * shape.uv_multiplier()
        } else {
            self.repeat
        }
    }
}

/// Tessellates a shape and centres it on its vertex centroid.
pub fn build_primitive(
    part: &NamedShape,
    options: &TessellationOptions,
) -> Result<(String, TriangleMesh)> {
    let (name, mut mesh) = shapes::generate(part, options)?;
    mesh.recenter();
    Ok((name, mesh))
}

/// Turns a generated mesh into authorable geometry. Every triangle corner
/// gets its own UV, so the face-UV indices are the identity sequence.
pub fn into_geometry(mesh: TriangleMesh, uv_factor: Vec2) -> GeometrySlice {
    let face_uv_indices = (0..mesh.triangle_uvs.len() as u32).collect();
    let uv_coords = mesh
        .triangle_uvs
        .iter()
        .map(|uv| *uv * uv_factor)
        .collect();

    GeometrySlice {
        vertices: mesh.vertices,
        faces: mesh.triangles,
        uv_coords,
        face_uv_indices,
    }
}

pub fn primitive_geometry(
    shape: &ShapeDescriptor,
    scaling: UvScaling,
    options: &TessellationOptions,
) -> Result<GeometrySlice> {
    let (_, mesh) = build_primitive(&NamedShape::from(*shape), options)?;
    Ok(into_geometry(mesh, scaling.factor(shape)))
}
