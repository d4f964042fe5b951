use glam::{Mat3, Vec3};

use crate::errors::Result;
use crate::geometry::GeometrySlice;
use crate::materials::UV_PRIMVAR;
use crate::math::{orientation_from_row_major, Transform};
use crate::stage::{AttributeHandle, Interpolation, PrimId, Stage, Value, ValueType, XformOp};

pub fn object_xform_path(name: &str) -> String {
    format!("/World/Mesh_Xform_{name}")
}

/// State of one simulated element at one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectPose {
    pub position: Vec3,
    pub orientation: Mat3,
    pub visible: bool,
    pub scale: Option<Vec3>,
}

impl ObjectPose {
    pub fn new(position: Vec3, orientation: Mat3) -> Self {
        Self {
            position,
            orientation,
            visible: true,
            scale: None,
        }
    }

    /// Pose from a simulator's position and row-major orientation matrix.
    pub fn from_row_major(position: [f32; 3], xmat: [f32; 9]) -> Self {
        Self::new(Vec3::from(position), orientation_from_row_major(xmat))
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn transform(&self) -> Transform {
        Transform {
            translation: self.position,
            rotation: self.orientation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityState {
    Hidden,
    Visible,
}

/// A run of frames an object was not seen in, ending at `shown_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityGap {
    pub hidden_at: u32,
    pub shown_at: u32,
}

/// Tracks the last frame an object was visible in.
///
/// Hidden frames are never written out. Instead, when an object becomes
/// visible after not being seen for more than one frame, the gap is closed
/// by an `invisible` key at the last visible frame and an `inherited` key at
/// the current one. The initial `-2` makes frame 0 count as such a return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityTracker {
    pub state: VisibilityState,
    pub last_visible_frame: i64,
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self {
            state: VisibilityState::Hidden,
            last_visible_frame: -2,
        }
    }
}

impl VisibilityTracker {
    pub fn observe(&mut self, visible: bool, frame: u32) -> Option<VisibilityGap> {
        let frame_index = i64::from(frame);

        if !visible {
            self.state = VisibilityState::Hidden;
            return None;
        }

        let gap = (frame_index - self.last_visible_frame > 1).then(|| VisibilityGap {
            // Clamped, so a first appearance after frame 0 is still keyed at 0
            hidden_at: self.last_visible_frame.max(0) as u32,
            shown_at: frame,
        });

        self.state = VisibilityState::Visible;
        self.last_visible_frame = frame_index;

        gap
    }
}

/// The xform node every scene object owns, with its animation channels.
#[derive(Debug, Clone)]
pub struct ObjectNode {
    pub name: String,
    pub xform: PrimId,
    pub transform_op: AttributeHandle,
    pub scale_op: AttributeHandle,
    pub visibility: AttributeHandle,
    pub tracker: VisibilityTracker,
}

impl ObjectNode {
    pub fn define(stage: &mut Stage, name: &str) -> Result<Self> {
        let xform = stage.define_xform(&object_xform_path(name))?;
        let transform_op = stage.add_xform_op(xform, XformOp::Transform)?;
        let scale_op = stage.add_xform_op(xform, XformOp::Scale)?;
        let visibility = stage.create_attribute(xform, "visibility", ValueType::Token)?;

        Ok(Self {
            name: name.to_string(),
            xform,
            transform_op,
            scale_op,
            visibility,
            tracker: VisibilityTracker::default(),
        })
    }

    pub fn path(&self) -> String {
        object_xform_path(&self.name)
    }
}

/// Per-frame animation contract shared by every exported object.
///
/// Implementors only provide access to their [`ObjectNode`]; the default
/// methods carry the common behaviour and can be overridden per kind.
pub trait SceneObject {
    fn node(&self) -> &ObjectNode;

    fn node_mut(&mut self) -> &mut ObjectNode;

    fn kind(&self) -> &'static str;

    fn name(&self) -> &str {
        &self.node().name
    }

    fn update(&mut self, stage: &mut Stage, pose: &ObjectPose, frame: u32) -> Result<()> {
        update_base(self, stage, pose, frame)
    }

    fn update_scale(&mut self, stage: &mut Stage, scale: Vec3, frame: u32) -> Result<()> {
        stage.set_sample(&self.node().scale_op, Value::Float3(scale), f64::from(frame))
    }

    fn update_visibility(&mut self, stage: &mut Stage, visible: bool, frame: u32) -> Result<()> {
        let token = if visible { "inherited" } else { "invisible" };
        stage.set_sample(&self.node().visibility, Value::token(token), f64::from(frame))
    }
}

/// Transform, visibility gap and scale, in that order.
pub fn update_base<O: SceneObject + ?Sized>(
    object: &mut O,
    stage: &mut Stage,
    pose: &ObjectPose,
    frame: u32,
) -> Result<()> {
    let matrix = pose.transform().to_dmat4();
    stage.set_sample(
        &object.node().transform_op,
        Value::Matrix4d(matrix),
        f64::from(frame),
    )?;

    if let Some(gap) = object.node_mut().tracker.observe(pose.visible, frame) {
        log::trace!(
            "{} visible again at {} (last seen {})",
            object.name(),
            gap.shown_at,
            gap.hidden_at
        );
        object.update_visibility(stage, false, gap.hidden_at)?;
        object.update_visibility(stage, true, gap.shown_at)?;
    }

    if let Some(scale) = pose.scale {
        object.update_scale(stage, scale, frame)?;
    }

    Ok(())
}

pub fn mesh_path(parent_path: &str, object_name: &str) -> String {
    format!("{parent_path}/Mesh_{object_name}")
}

/// Writes topology, points and face-varying UVs onto a mesh prim.
pub fn author_mesh(stage: &mut Stage, mesh: PrimId, geometry: &GeometrySlice) -> Result<()> {
    let points = stage.create_attribute(mesh, "points", ValueType::Point3fArray)?;
    stage.set(&points, Value::Point3fArray(geometry.vertices.clone()))?;

    let counts = stage.create_attribute(mesh, "faceVertexCounts", ValueType::IntArray)?;
    stage.set(&counts, Value::IntArray(geometry.face_vertex_counts()))?;

    let indices = stage.create_attribute(mesh, "faceVertexIndices", ValueType::IntArray)?;
    stage.set(&indices, Value::IntArray(geometry.face_vertex_indices()))?;

    let uv_name = format!("primvars:{UV_PRIMVAR}");
    let uvs = stage.create_attribute(mesh, &uv_name, ValueType::TexCoord2fArray)?;
    stage.set(&uvs, Value::TexCoord2fArray(geometry.uv_coords.clone()))?;
    stage.set_interpolation(&uvs, Interpolation::FaceVarying)?;

    let uv_indices = stage.create_attribute(mesh, &format!("{uv_name}:indices"), ValueType::IntArray)?;
    stage.set(&uv_indices, Value::IntArray(geometry.face_uv_indices_i32()))?;

    Ok(())
}

/// Procedural meshes are exported as final geometry, not subdivision cages.
pub fn disable_subdivision(stage: &mut Stage, mesh: PrimId) -> Result<()> {
    let scheme = stage.create_uniform_attribute(mesh, "subdivisionScheme", ValueType::Token)?;
    stage.set(&scheme, Value::token("none"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_visible_frame_is_a_gap_clamped_to_zero() {
        let mut tracker = VisibilityTracker::default();
        assert_eq!(
            tracker.observe(true, 0),
            Some(VisibilityGap {
                hidden_at: 0,
                shown_at: 0
            })
        );
        assert_eq!(tracker.state, VisibilityState::Visible);
    }

    #[test]
    fn consecutive_frames_have_no_gap() {
        let mut tracker = VisibilityTracker::default();
        tracker.observe(true, 0);
        assert_eq!(tracker.observe(true, 1), None);
        assert_eq!(tracker.last_visible_frame, 1);
    }

    #[test]
    fn hidden_frames_leave_last_visible_frame_alone() {
        let mut tracker = VisibilityTracker::default();
        tracker.observe(true, 0);
        tracker.observe(true, 1);
        for frame in 2..10 {
            assert_eq!(tracker.observe(false, frame), None);
        }
        assert_eq!(tracker.state, VisibilityState::Hidden);
        assert_eq!(tracker.last_visible_frame, 1);
        assert_eq!(
            tracker.observe(true, 10),
            Some(VisibilityGap {
                hidden_at: 1,
                shown_at: 10
            })
        );
    }

    #[test]
    fn late_first_appearance_is_keyed_from_zero() {
        let mut tracker = VisibilityTracker::default();
        assert_eq!(
            tracker.observe(true, 7),
            Some(VisibilityGap {
                hidden_at: 0,
                shown_at: 7
            })
        );
    }
}
