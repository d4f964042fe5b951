use id_arena::Id;

use crate::stage::attribute::{Attribute, Value};

pub type PrimId = Id<Prim>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimType {
    /// Created implicitly as the ancestor of a defined prim.
    Untyped,
    Xform,
    Mesh,
    Scope,
    Material,
    Shader,
}

impl PrimType {
    pub fn schema_name(self) -> Option<&'static str> {
        match self {
            PrimType::Untyped => None,
            PrimType::Xform => Some("Xform"),
            PrimType::Mesh => Some("Mesh"),
            PrimType::Scope => Some("Scope"),
            PrimType::Material => Some("Material"),
            PrimType::Shader => Some("Shader"),
        }
    }

    pub fn describe(self) -> &'static str {
        self.schema_name().unwrap_or("untyped")
    }
}

/// A node of the scene document.
#[derive(Debug, Clone)]
pub struct Prim {
    pub path: String,
    pub name: String,
    pub prim_type: PrimType,
    pub parent_id: Option<PrimId>,
    pub child_ids: Vec<PrimId>,
    pub api_schemas: Vec<String>,
    attributes: Vec<Attribute>,
    relationships: Vec<(String, Vec<String>)>,
}

impl Prim {
    pub(crate) fn new(path: String, name: String, prim_type: PrimType) -> Self {
        Self {
            path,
            name,
            prim_type,
            parent_id: None,
            child_ids: Vec::new(),
            api_schemas: Vec::new(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Attributes in authoring order.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
    }

    pub(crate) fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes
            .iter_mut()
            .find(|attribute| attribute.name == name)
    }

    pub(crate) fn push_attribute(&mut self, attribute: Attribute) -> &mut Attribute {
        self.attributes.push(attribute);
        let last = self.attributes.len() - 1;
        &mut self.attributes[last]
    }

    pub fn relationships(&self) -> &[(String, Vec<String>)] {
        &self.relationships
    }

    pub fn relationship(&self, name: &str) -> Option<&[String]> {
        self.relationships
            .iter()
            .find(|(rel_name, _)| rel_name == name)
            .map(|(_, targets)| targets.as_slice())
    }

    /// Replaces any previous targets of the relationship.
    pub(crate) fn set_relationship(&mut self, name: &str, targets: Vec<String>) {
        match self
            .relationships
            .iter_mut()
            .find(|(rel_name, _)| rel_name == name)
        {
            Some((_, existing)) => *existing = targets,
            None => self.relationships.push((name.to_string(), targets)),
        }
    }

    pub fn xform_op_order(&self) -> Vec<String> {
        match self
            .attribute("xformOpOrder")
            .and_then(|attribute| attribute.default_value())
        {
            Some(Value::TokenArray(ops)) => ops.clone(),
            _ => Vec::new(),
        }
    }
}
