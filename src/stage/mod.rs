//! In-memory scene document.
//!
//! Prims live in an arena and are addressed by absolute paths
//! (`/World/Mesh_Xform_box`). Attributes carry a default value and/or time
//! samples; see [`Attribute`] for the sampling contract. [`usda`] serialises
//! the whole stage as text.

pub mod attribute;
pub mod prim;
pub mod usda;

use std::collections::HashMap;

use id_arena::Arena;

use crate::errors::{ExportError, Result};

pub use attribute::{Attribute, Interpolation, TimeSample, Value, ValueType, Variability};
pub use prim::{Prim, PrimId, PrimType};

/// Layer-level metadata written at the top of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct StageMetadata {
    pub default_prim: Option<String>,
    pub start_time_code: f64,
    pub end_time_code: f64,
    pub frames_per_second: f64,
    pub time_codes_per_second: f64,
    pub up_axis: String,
    pub meters_per_unit: f64,
}

impl Default for StageMetadata {
    fn default() -> Self {
        Self {
            default_prim: None,
            start_time_code: 0.0,
            end_time_code: 0.0,
            frames_per_second: 24.0,
            time_codes_per_second: 24.0,
            up_axis: "Y".to_string(),
            meters_per_unit: 0.01,
        }
    }
}

/// Names one attribute of one prim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeHandle {
    pub prim: PrimId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XformOp {
    Transform,
    Translate,
    Scale,
}

impl XformOp {
    pub fn attribute_name(self) -> &'static str {
        match self {
            XformOp::Transform => "xformOp:transform",
            XformOp::Translate => "xformOp:translate",
            XformOp::Scale => "xformOp:scale",
        }
    }

    pub fn value_type(self) -> ValueType {
        match self {
            XformOp::Transform => ValueType::Matrix4d,
            XformOp::Translate | XformOp::Scale => ValueType::Float3,
        }
    }
}

/// One time-sampled write, as recorded by the write log.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWrite {
    pub path: String,
    pub attribute: String,
    pub time: f64,
    pub value: Value,
}

/// Whether `name` can be used as a prim name as is.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Rewrites an arbitrary name into a legal prim name.
pub fn make_valid_identifier(name: &str) -> String {
    let mut identifier: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if !identifier.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        identifier.insert(0, '_');
    }

    identifier
}

/// Splits `/a/b/c` into (`/a/b`, `c`); the parent of a root prim is `""`.
fn split_path(path: &str) -> Result<(&str, &str)> {
    let invalid = || ExportError::InvalidPath(path.to_string());

    if !path.starts_with('/') {
        return Err(invalid());
    }

    let (parent, name) = path.rsplit_once('/').ok_or_else(invalid)?;

    if !is_valid_identifier(name) || (!parent.is_empty() && split_path(parent).is_err()) {
        return Err(invalid());
    }

    Ok((parent, name))
}

pub struct Stage {
    pub metadata: StageMetadata,
    prims: Arena<Prim>,
    prims_by_path: HashMap<String, PrimId>,
    root_ids: Vec<PrimId>,
    write_log: Option<Vec<SampleWrite>>,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    pub fn new() -> Self {
        Self {
            metadata: StageMetadata::default(),
            prims: Arena::new(),
            prims_by_path: HashMap::new(),
            root_ids: Vec::new(),
            write_log: None,
        }
    }

    /// Starts recording every time-sampled write, in call order.
    pub fn enable_write_log(&mut self) {
        self.write_log.get_or_insert_with(Vec::new);
    }

    pub fn write_log(&self) -> &[SampleWrite] {
        self.write_log.as_deref().unwrap_or(&[])
    }

    pub fn root_ids(&self) -> &[PrimId] {
        &self.root_ids
    }

    pub fn prim(&self, id: PrimId) -> Option<&Prim> {
        self.prims.get(id)
    }

    fn prim_mut(&mut self, id: PrimId) -> Result<&mut Prim> {
        self.prims
            .get_mut(id)
            .ok_or_else(|| ExportError::UnknownPrim(format!("{id:?}")))
    }

    pub fn prim_at_path(&self, path: &str) -> Option<PrimId> {
        self.prims_by_path.get(path).copied()
    }

    pub fn path_of(&self, id: PrimId) -> Option<&str> {
        self.prim(id).map(|prim| prim.path.as_str())
    }

    pub fn children(&self, id: PrimId) -> impl Iterator<Item = &Prim> + '_ {
        self.prim(id)
            .into_iter()
            .flat_map(|prim| prim.child_ids.iter())
            .filter_map(move |child_id| self.prims.get(*child_id))
    }

    /// Defines a prim, creating missing ancestors as untyped prims.
    ///
    /// Defining an existing path returns the existing prim; an untyped prim
    /// takes on the requested type.
    pub fn define_prim(&mut self, path: &str, prim_type: PrimType) -> Result<PrimId> {
        let (parent_path, name) = split_path(path)?;

        if let Some(existing_id) = self.prim_at_path(path) {
            let existing = self.prim_mut(existing_id)?;
            if existing.prim_type == PrimType::Untyped {
                existing.prim_type = prim_type;
            } else if existing.prim_type != prim_type && prim_type != PrimType::Untyped {
                return Err(ExportError::PrimTypeConflict {
                    path: path.to_string(),
                    existing: existing.prim_type.describe(),
                    requested: prim_type.describe(),
                });
            }
            return Ok(existing_id);
        }

        let parent_id = if parent_path.is_empty() {
            None
        } else {
            Some(match self.prim_at_path(parent_path) {
                Some(parent_id) => parent_id,
                None => self.define_prim(parent_path, PrimType::Untyped)?,
            })
        };

        let mut prim = Prim::new(path.to_string(), name.to_string(), prim_type);
        prim.parent_id = parent_id;
        let id = self.prims.alloc(prim);
        self.prims_by_path.insert(path.to_string(), id);

        match parent_id {
            Some(parent_id) => self.prim_mut(parent_id)?.child_ids.push(id),
            None => self.root_ids.push(id),
        }

        log::trace!("Defined {} {}", prim_type.describe(), path);

        Ok(id)
    }

    pub fn define_xform(&mut self, path: &str) -> Result<PrimId> {
        self.define_prim(path, PrimType::Xform)
    }

    pub fn define_mesh(&mut self, path: &str) -> Result<PrimId> {
        self.define_prim(path, PrimType::Mesh)
    }

    pub fn define_material(&mut self, path: &str) -> Result<PrimId> {
        self.define_prim(path, PrimType::Material)
    }

    pub fn define_shader(&mut self, path: &str) -> Result<PrimId> {
        self.define_prim(path, PrimType::Shader)
    }

    /// Unlinks every descendant of `id` from the document. Returns how many
    /// direct children were removed.
    pub fn detach_children(&mut self, id: PrimId) -> Result<usize> {
        let child_ids = std::mem::take(&mut self.prim_mut(id)?.child_ids);
        let mut pending = child_ids.clone();

        while let Some(child_id) = pending.pop() {
            if let Some(child) = self.prims.get(child_id) {
                self.prims_by_path.remove(&child.path);
                pending.extend(child.child_ids.iter().copied());
            }
        }

        Ok(child_ids.len())
    }

    pub fn apply_api_schema(&mut self, id: PrimId, schema: &str) -> Result<()> {
        let prim = self.prim_mut(id)?;
        if !prim.api_schemas.iter().any(|existing| existing == schema) {
            prim.api_schemas.push(schema.to_string());
        }
        Ok(())
    }

    /// Creates an attribute, or returns the existing one if the type agrees.
    pub fn create_attribute(
        &mut self,
        id: PrimId,
        name: &str,
        value_type: ValueType,
    ) -> Result<AttributeHandle> {
        let prim = self.prim_mut(id)?;

        match prim.attribute(name).map(|existing| existing.value_type) {
            Some(existing_type) if existing_type != value_type => {
                return Err(ExportError::TypeMismatch {
                    path: prim.path.clone(),
                    attribute: name.to_string(),
                    expected: existing_type.usda_name(),
                    actual: value_type.usda_name(),
                });
            }
            Some(_) => {}
            None => {
                prim.push_attribute(Attribute::new(name, value_type));
            }
        }

        Ok(AttributeHandle {
            prim: id,
            name: name.to_string(),
        })
    }

    pub fn create_uniform_attribute(
        &mut self,
        id: PrimId,
        name: &str,
        value_type: ValueType,
    ) -> Result<AttributeHandle> {
        let handle = self.create_attribute(id, name, value_type)?;
        self.attribute_mut(&handle)?.variability = Variability::Uniform;
        Ok(handle)
    }

    /// Adds a transform operation and appends it to the prim's op order.
    pub fn add_xform_op(&mut self, id: PrimId, op: XformOp) -> Result<AttributeHandle> {
        let handle = self.create_attribute(id, op.attribute_name(), op.value_type())?;

        let mut order = self.prim(id).map(Prim::xform_op_order).unwrap_or_default();
        if !order.iter().any(|name| name == op.attribute_name()) {
            order.push(op.attribute_name().to_string());
        }

        let order_handle =
            self.create_uniform_attribute(id, "xformOpOrder", ValueType::TokenArray)?;
        self.set(&order_handle, Value::TokenArray(order))?;

        Ok(handle)
    }

    pub fn attribute(&self, handle: &AttributeHandle) -> Option<&Attribute> {
        self.prim(handle.prim)
            .and_then(|prim| prim.attribute(&handle.name))
    }

    /// Looks an attribute up by prim path and name.
    pub fn attribute_at(&self, path: &str, name: &str) -> Option<&Attribute> {
        self.prim_at_path(path)
            .and_then(|id| self.prim(id))
            .and_then(|prim| prim.attribute(name))
    }

    fn attribute_mut(&mut self, handle: &AttributeHandle) -> Result<&mut Attribute> {
        let prim = self.prim_mut(handle.prim)?;
        let path = prim.path.clone();
        prim.attribute_mut(&handle.name)
            .ok_or_else(|| ExportError::UnknownAttribute {
                path,
                attribute: handle.name.clone(),
            })
    }

    fn typed_attribute_mut(
        &mut self,
        handle: &AttributeHandle,
        value: &Value,
    ) -> Result<&mut Attribute> {
        let path = self
            .path_of(handle.prim)
            .map(String::from)
            .unwrap_or_default();
        let attribute = self.attribute_mut(handle)?;

        if attribute.value_type != value.value_type() {
            return Err(ExportError::TypeMismatch {
                path,
                attribute: handle.name.clone(),
                expected: attribute.value_type.usda_name(),
                actual: value.value_type().usda_name(),
            });
        }

        Ok(attribute)
    }

    /// Sets the attribute's default (untimed) value.
    pub fn set(&mut self, handle: &AttributeHandle, value: Value) -> Result<()> {
        self.typed_attribute_mut(handle, &value)?.set_default(value);
        Ok(())
    }

    /// Writes a time sample at `time`.
    pub fn set_sample(&mut self, handle: &AttributeHandle, value: Value, time: f64) -> Result<()> {
        let log_entry = self.write_log.is_some().then(|| value.clone());
        self.typed_attribute_mut(handle, &value)?
            .insert_sample(time, value);

        if let Some(value) = log_entry {
            let path = self
                .path_of(handle.prim)
                .map(String::from)
                .unwrap_or_default();
            if let Some(write_log) = self.write_log.as_mut() {
                write_log.push(SampleWrite {
                    path,
                    attribute: handle.name.clone(),
                    time,
                    value,
                });
            }
        }

        Ok(())
    }

    pub fn set_interpolation(
        &mut self,
        handle: &AttributeHandle,
        interpolation: Interpolation,
    ) -> Result<()> {
        self.attribute_mut(handle)?.interpolation = Some(interpolation);
        Ok(())
    }

    /// Connects `handle` to the output or input named by `source`.
    pub fn connect(&mut self, handle: &AttributeHandle, source: &AttributeHandle) -> Result<()> {
        let source_path = self
            .path_of(source.prim)
            .ok_or_else(|| ExportError::UnknownPrim(format!("{:?}", source.prim)))?;
        let target = format!("{}.{}", source_path, source.name);
        self.attribute_mut(handle)?.connection = Some(target);
        Ok(())
    }

    pub fn set_relationship(&mut self, id: PrimId, name: &str, targets: Vec<String>) -> Result<()> {
        self.prim_mut(id)?.set_relationship(name, targets);
        Ok(())
    }
}
