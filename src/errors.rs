use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    /// A mesh object referenced an asset the arena does not contain.
    #[error("mesh asset {asset_id} out of range (arena holds {asset_count} assets)")]
    InvalidAssetId { asset_id: usize, asset_count: usize },

    /// The flat mesh arrays do not describe a consistent arena.
    #[error("malformed mesh arena: {0}")]
    InvalidArena(String),

    /// A procedural shape was given dimensions it cannot be built from.
    #[error("invalid {shape} parameters: {reason}")]
    InvalidShape { shape: &'static str, reason: String },

    #[error("object name '{0}' is already used in this stage")]
    DuplicateObjectName(String),

    #[error("no scene object {0}")]
    UnknownObject(String),

    #[error("composite object '{0}' has no parts")]
    EmptyComposite(String),

    #[error("invalid prim path '{0}'")]
    InvalidPath(String),

    /// `Define` was called on a path that already holds a prim of another type.
    #[error("prim {path} is already defined as {existing}, cannot redefine as {requested}")]
    PrimTypeConflict {
        path: String,
        existing: &'static str,
        requested: &'static str,
    },

    #[error("no prim at {0}")]
    UnknownPrim(String),

    #[error("no attribute '{attribute}' on {path}")]
    UnknownAttribute { path: String, attribute: String },

    #[error("attribute '{attribute}' on {path} holds {expected} values, got {actual}")]
    TypeMismatch {
        path: String,
        attribute: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
