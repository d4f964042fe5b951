use std::collections::HashMap;
use std::path::Path;

use id_arena::{Arena, Id};

use crate::asset_pipeline::MeshAssetArena;
use crate::config::ExportConfig;
use crate::errors::{ExportError, Result};
use crate::geometry::shapes::NamedShape;
use crate::geometry::ShapeDescriptor;
use crate::materials::{VisualAttributes, MATERIALS_SCOPE};
use crate::objects::{CompositeObject, MeshObject, ObjectPose, PrimitiveObject, SceneObject};
use crate::stage::{self, is_valid_identifier, PrimType, Stage};

pub const WORLD_PATH: &str = "/World";

pub type ObjectId = Id<Box<dyn SceneObject>>;

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// One asset of the session's mesh arena.
    Mesh { asset_id: usize },
    Primitive(ShapeDescriptor),
    Composite(Vec<NamedShape>),
}

/// Everything needed to create one scene object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDescriptor {
    pub name: String,
    pub kind: ObjectKind,
    pub visual: VisualAttributes,
}

impl ObjectDescriptor {
    pub fn new(name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visual: VisualAttributes::default(),
        }
    }

    pub fn mesh(name: impl Into<String>, asset_id: usize) -> Self {
        Self::new(name, ObjectKind::Mesh { asset_id })
    }

    pub fn primitive(name: impl Into<String>, shape: ShapeDescriptor) -> Self {
        Self::new(name, ObjectKind::Primitive(shape))
    }

    pub fn composite(name: impl Into<String>, parts: Vec<NamedShape>) -> Self {
        Self::new(name, ObjectKind::Composite(parts))
    }

    pub fn with_visual(mut self, visual: VisualAttributes) -> Self {
        self.visual = visual;
        self
    }
}

/// Owns the stage and every object exported into it.
pub struct ExportSession {
    config: ExportConfig,
    stage: Stage,
    arena: MeshAssetArena,
    objects: Arena<Box<dyn SceneObject>>,
    objects_by_name: HashMap<String, ObjectId>,
    last_frames: HashMap<ObjectId, u32>,
}

impl ExportSession {
    pub fn new(config: ExportConfig, arena: MeshAssetArena) -> Result<Self> {
        let mut stage = Stage::new();
        stage.metadata.default_prim = Some(WORLD_PATH.trim_start_matches('/').to_string());
        stage.metadata.frames_per_second = config.frames_per_second;
        stage.metadata.time_codes_per_second = config.frames_per_second;
        stage.metadata.up_axis = config.up_axis.token().to_string();
        stage.metadata.meters_per_unit = config.meters_per_unit;

        stage.define_xform(WORLD_PATH)?;
        stage.define_prim(MATERIALS_SCOPE, PrimType::Scope)?;

        log::debug!(
            "Export session at {} fps with {} mesh assets",
            config.frames_per_second,
            arena.asset_count()
        );

        Ok(Self {
            config,
            stage,
            arena,
            objects: Arena::new(),
            objects_by_name: HashMap::new(),
            last_frames: HashMap::new(),
        })
    }

    /// Creates the object's nodes, geometry and material. On error nothing
    /// is registered.
    pub fn add_object(&mut self, descriptor: &ObjectDescriptor) -> Result<ObjectId> {
        let name = descriptor.name.as_str();

        if self.objects_by_name.contains_key(name) {
            return Err(ExportError::DuplicateObjectName(name.to_string()));
        }

        if !is_valid_identifier(name) {
            return Err(ExportError::InvalidPath(name.to_string()));
        }

        let visual = &descriptor.visual;
        let tessellation = &self.config.tessellation;

        let object: Box<dyn SceneObject> = match &descriptor.kind {
            ObjectKind::Mesh { asset_id } => Box::new(MeshObject::new(
                &mut self.stage,
                &self.arena,
                name,
                *asset_id,
                visual,
            )?),
            ObjectKind::Primitive(shape) => Box::new(PrimitiveObject::new(
                &mut self.stage,
                name,
                *shape,
                visual,
                tessellation,
            )?),
            ObjectKind::Composite(parts) => Box::new(CompositeObject::new(
                &mut self.stage,
                name,
                parts,
                visual,
                tessellation,
            )?),
        };

        let id = self.objects.alloc(object);
        self.objects_by_name.insert(name.to_string(), id);

        Ok(id)
    }

    pub fn object_id(&self, name: &str) -> Option<ObjectId> {
        self.objects_by_name.get(name).copied()
    }

    pub fn object(&self, id: ObjectId) -> Option<&dyn SceneObject> {
        self.objects.get(id).map(|object| object.as_ref())
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &dyn SceneObject)> {
        self.objects
            .iter()
            .map(|(id, object)| (id, object.as_ref()))
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Last frame written for `id`, if any.
    pub fn last_frame(&self, id: ObjectId) -> Option<u32> {
        self.last_frames.get(&id).copied()
    }

    /// Whether `frame` goes back in time for this object. Objects are
    /// tracked separately, so driving them one after another is fine.
    pub fn is_out_of_order(&self, id: ObjectId, frame: u32) -> bool {
        self.last_frame(id)
            .is_some_and(|last_frame| frame < last_frame)
    }

    /// Writes one frame of one object.
    ///
    /// Frames are passed through as is; going backwards is allowed but logged,
    /// since later samples at an existing time replace earlier ones.
    pub fn update_object(&mut self, id: ObjectId, pose: &ObjectPose, frame: u32) -> Result<()> {
        let earlier = self.last_frame(id).filter(|&last_frame| frame < last_frame);
        let object = self
            .objects
            .get_mut(id)
            .ok_or_else(|| ExportError::UnknownObject(format!("{id:?}")))?;

        if let Some(last_frame) = earlier {
            log::warn!(
                "Frame {frame} for {} is earlier than frame {last_frame}",
                object.name()
            );
        }

        object.update(&mut self.stage, pose, frame)?;

        self.last_frames.insert(id, frame);
        self.stage.metadata.end_time_code = self.stage.metadata.end_time_code.max(f64::from(frame));

        Ok(())
    }

    pub fn update_by_name(&mut self, name: &str, pose: &ObjectPose, frame: u32) -> Result<()> {
        let id = self
            .object_id(name)
            .ok_or_else(|| ExportError::UnknownObject(name.to_string()))?;
        self.update_object(id, pose, frame)
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn arena(&self) -> &MeshAssetArena {
        &self.arena
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    pub fn to_usda(&self) -> Result<String> {
        stage::usda::to_usda_string(&self.stage)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        stage::usda::save(&self.stage, path)
    }
}
