use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Vec2, Vec3};

use crate::errors::{ExportError, Result};
use crate::geometry::mesh::TriangleMesh;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TessellationOptions {
    /// Number of latitude steps for spheres. Longitudes use twice as many.
    pub resolution: u32,
}

impl Default for TessellationOptions {
    fn default() -> Self {
        Self { resolution: 20 }
    }
}

impl TessellationOptions {
    fn latitude_steps(&self) -> u32 {
        self.resolution.max(2)
    }

    fn longitude_steps(&self) -> u32 {
        self.resolution.saturating_mul(2).max(3)
    }
}

/// Which way a hemisphere's dome points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapDirection {
    PositiveZ,
    NegativeZ,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeDescriptor {
    Box { width: f32, height: f32, depth: f32 },
    Sphere { radius: f32 },
    Cylinder { radius: f32, height: f32 },
    Hemisphere { radius: f32, direction: CapDirection },
    Plane { width: f32, height: f32 },
}

impl ShapeDescriptor {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ShapeDescriptor::Box { .. } => "box",
            ShapeDescriptor::Sphere { .. } => "sphere",
            ShapeDescriptor::Cylinder { .. } => "cylinder",
            ShapeDescriptor::Hemisphere { .. } => "hemisphere",
            ShapeDescriptor::Plane { .. } => "plane",
        }
    }

    /// Size factors applied to UVs under the texture-uniform policy, so a
    /// repeating texture keeps the same density on differently sized shapes.
    pub fn uv_multiplier(&self) -> Vec2 {
        match *self {
            ShapeDescriptor::Box { width, height, .. } => Vec2::new(width, height),
            ShapeDescriptor::Sphere { radius } => Vec2::splat(radius),
            _ => Vec2::ONE,
        }
    }

    pub fn named(self, name: impl Into<String>) -> NamedShape {
        NamedShape {
            name: name.into(),
            shape: self,
        }
    }

    fn dimensions(&self) -> Vec<(&'static str, f32)> {
        match *self {
            ShapeDescriptor::Box {
                width,
                height,
                depth,
            } => vec![("width", width), ("height", height), ("depth", depth)],
            ShapeDescriptor::Sphere { radius } | ShapeDescriptor::Hemisphere { radius, .. } => {
                vec![("radius", radius)]
            }
            ShapeDescriptor::Cylinder { radius, height } => {
                vec![("radius", radius), ("height", height)]
            }
            ShapeDescriptor::Plane { width, height } => vec![("width", width), ("height", height)],
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (dimension, value) in self.dimensions() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ExportError::InvalidShape {
                    shape: self.kind_name(),
                    reason: format!("{dimension} must be positive and finite, got {value}"),
                });
            }
        }

        Ok(())
    }
}

/// A shape together with the part name it is generated under.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedShape {
    pub name: String,
    pub shape: ShapeDescriptor,
}

impl From<ShapeDescriptor> for NamedShape {
    fn from(shape: ShapeDescriptor) -> Self {
        shape.named(shape.kind_name())
    }
}

/// Generates the mesh for one named shape.
pub fn generate(part: &NamedShape, options: &TessellationOptions) -> Result<(String, TriangleMesh)> {
    part.shape.validate()?;

    let mesh = match part.shape {
        ShapeDescriptor::Box {
            width,
            height,
            depth,
        } => create_box(width, height, depth),
        ShapeDescriptor::Sphere { radius } => create_sphere(radius, options),
        ShapeDescriptor::Cylinder { radius, height } => create_cylinder(radius, height, options),
        ShapeDescriptor::Hemisphere { radius, direction } => {
            create_hemisphere(radius, direction, options)
        }
        ShapeDescriptor::Plane { width, height } => create_plane(width, height),
    };

    Ok((part.name.clone(), mesh))
}

/// The three parts of a capsule: a unit-height cylinder body and two domed caps.
///
/// Per-frame scaling stretches the body along Z; the caps are kept flush by
/// the composite object's offset rules.
pub fn capsule_parts(radius: f32, half_length: f32) -> Vec<NamedShape> {
    vec![
        ShapeDescriptor::Cylinder {
            radius,
            height: half_length * 2.0,
        }
        .named("cylinder"),
        ShapeDescriptor::Hemisphere {
            radius,
            direction: CapDirection::NegativeZ,
        }
        .named("left_hemisphere"),
        ShapeDescriptor::Hemisphere {
            radius,
            direction: CapDirection::PositiveZ,
        }
        .named("right_hemisphere"),
    ]
}

const UNIT_SQUARE: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

fn push_quad(mesh: &mut TriangleMesh, quad: [u32; 4]) {
    let [a, b, c, d] = quad;
    let [uv_a, uv_b, uv_c, uv_d] = UNIT_SQUARE;
    mesh.push_triangle([a, b, c], [uv_a, uv_b, uv_c]);
    mesh.push_triangle([a, c, d], [uv_a, uv_c, uv_d]);
}

pub fn create_box(width: f32, height: f32, depth: f32) -> TriangleMesh {
    let half = Vec3::new(width, height, depth) / 2.0;
    let mut mesh = TriangleMesh::default();

    // Corner index bits: x | y << 1 | z << 2
    for corner in 0..8u32 {
        let sign = |bit: u32| if corner & bit != 0 { 1.0 } else { -1.0 };
        mesh.push_vertex(half * Vec3::new(sign(1), sign(2), sign(4)));
    }

    // Counter-clockwise seen from outside
    let faces = [
        [0, 2, 3, 1], // -Z
        [4, 5, 7, 6], // +Z
        [0, 1, 5, 4], // -Y
        [2, 6, 7, 3], // +Y
        [0, 4, 6, 2], // -X
        [1, 3, 7, 5], // +X
    ];

    for face in faces {
        push_quad(&mut mesh, face);
    }

    mesh
}

pub fn create_plane(width: f32, height: f32) -> TriangleMesh {
    let mut mesh = TriangleMesh::default();
    let (w, h) = (width / 2.0, height / 2.0);

    let a = mesh.push_vertex(Vec3::new(-w, -h, 0.0));
    let b = mesh.push_vertex(Vec3::new(w, -h, 0.0));
    let c = mesh.push_vertex(Vec3::new(w, h, 0.0));
    let d = mesh.push_vertex(Vec3::new(-w, h, 0.0));
    push_quad(&mut mesh, [a, b, c, d]);

    mesh
}

/// Latitude/longitude dome around +Z, from the north pole down to
/// `theta_max`. With `close_south` the last row collapses into a south pole.
fn create_dome(
    radius: f32,
    theta_max: f32,
    rows: u32,
    segments: u32,
    close_south: bool,
) -> TriangleMesh {
    let mut mesh = TriangleMesh::default();
    let north = mesh.push_vertex(Vec3::new(0.0, 0.0, radius));

    let ring_count = if close_south { rows - 1 } else { rows };
    for row in 1..=ring_count {
        let (sin_theta, cos_theta) = (theta_max * row as f32 / rows as f32).sin_cos();
        for segment in 0..segments {
            let (sin_phi, cos_phi) = (TAU * segment as f32 / segments as f32).sin_cos();
            mesh.push_vertex(
                radius * Vec3::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta),
            );
        }
    }

    let ring_vertex = |row: u32, segment: u32| 1 + (row - 1) * segments + segment % segments;
    let uv = |row: u32, segment: u32| {
        Vec2::new(
            segment as f32 / segments as f32,
            1.0 - row as f32 / rows as f32,
        )
    };
    let pole_uv = |row: u32, segment: u32| {
        Vec2::new(
            (segment as f32 + 0.5) / segments as f32,
            1.0 - row as f32 / rows as f32,
        )
    };

    for segment in 0..segments {
        mesh.push_triangle(
            [
                north,
                ring_vertex(1, segment),
                ring_vertex(1, segment + 1),
            ],
            [pole_uv(0, segment), uv(1, segment), uv(1, segment + 1)],
        );
    }

    for row in 1..ring_count {
        for segment in 0..segments {
            let a = ring_vertex(row, segment);
            let b = ring_vertex(row, segment + 1);
            let c = ring_vertex(row + 1, segment + 1);
            let d = ring_vertex(row + 1, segment);

            let (uv_a, uv_b) = (uv(row, segment), uv(row, segment + 1));
            let (uv_c, uv_d) = (uv(row + 1, segment + 1), uv(row + 1, segment));

            mesh.push_triangle([a, d, c], [uv_a, uv_d, uv_c]);
            mesh.push_triangle([a, c, b], [uv_a, uv_c, uv_b]);
        }
    }

    if close_south {
        let south = mesh.push_vertex(Vec3::new(0.0, 0.0, -radius));
        for segment in 0..segments {
            mesh.push_triangle(
                [
                    ring_vertex(ring_count, segment),
                    south,
                    ring_vertex(ring_count, segment + 1),
                ],
                [
                    uv(ring_count, segment),
                    pole_uv(rows, segment),
                    uv(ring_count, segment + 1),
                ],
            );
        }
    }

    mesh
}

pub fn create_sphere(radius: f32, options: &TessellationOptions) -> TriangleMesh {
    create_dome(
        radius,
        PI,
        options.latitude_steps(),
        options.longitude_steps(),
        true,
    )
}

/// Open dome without a base; it sits against a cylinder body in capsules.
pub fn create_hemisphere(
    radius: f32,
    direction: CapDirection,
    options: &TessellationOptions,
) -> TriangleMesh {
    let rows = (options.latitude_steps() / 2).max(1);
    let mut mesh = create_dome(radius, FRAC_PI_2, rows, options.longitude_steps(), false);

    if direction == CapDirection::NegativeZ {
        mesh.mirror_z();
    }

    mesh
}

/// Closed cylinder along Z, centred on the origin.
pub fn create_cylinder(radius: f32, height: f32, options: &TessellationOptions) -> TriangleMesh {
    let segments = options.longitude_steps();
    let mut mesh = TriangleMesh::default();
    let half_height = height / 2.0;

    for z in [-half_height, half_height] {
        for segment in 0..segments {
            let (sin_phi, cos_phi) = (TAU * segment as f32 / segments as f32).sin_cos();
            mesh.push_vertex(Vec3::new(radius * cos_phi, radius * sin_phi, z));
        }
    }

    let bottom = |segment: u32| segment % segments;
    let top = |segment: u32| segments + segment % segments;
    let side_uv = |segment: u32, v: f32| Vec2::new(segment as f32 / segments as f32, v);
    let cap_uv = |segment: u32| {
        let (sin_phi, cos_phi) = (TAU * segment as f32 / segments as f32).sin_cos();
        Vec2::new(0.5 + 0.5 * cos_phi, 0.5 + 0.5 * sin_phi)
    };

    for segment in 0..segments {
        let (a, b) = (bottom(segment), bottom(segment + 1));
        let (c, d) = (top(segment + 1), top(segment));

        let (uv_a, uv_b) = (side_uv(segment, 0.0), side_uv(segment + 1, 0.0));
        let (uv_c, uv_d) = (side_uv(segment + 1, 1.0), side_uv(segment, 1.0));

        mesh.push_triangle([a, b, c], [uv_a, uv_b, uv_c]);
        mesh.push_triangle([a, c, d], [uv_a, uv_c, uv_d]);
    }

    let top_center = mesh.push_vertex(Vec3::new(0.0, 0.0, half_height));
    let bottom_center = mesh.push_vertex(Vec3::new(0.0, 0.0, -half_height));
    let center_uv = Vec2::splat(0.5);

    for segment in 0..segments {
        mesh.push_triangle(
            [top_center, top(segment), top(segment + 1)],
            [center_uv, cap_uv(segment), cap_uv(segment + 1)],
        );
        mesh.push_triangle(
            [bottom_center, bottom(segment + 1), bottom(segment)],
            [center_uv, cap_uv(segment + 1), cap_uv(segment)],
        );
    }

    mesh
}
