//! Exports simulated scenes as time-sampled USD documents.
//!
//! Visual elements of a physics scene become [`objects`]: meshes sliced out
//! of a shared [`MeshAssetArena`], procedural primitives, or composites made
//! of several primitive parts. An [`ExportSession`] owns them together with
//! the [`Stage`] they write into, and each simulation frame is pushed through
//! [`ExportSession::update_object`].

pub mod asset_pipeline;
pub mod config;
pub mod errors;
pub mod geometry;
pub mod materials;
pub mod math;
pub mod objects;
pub mod session;
pub mod stage;

pub use asset_pipeline::MeshAssetArena;
pub use config::ExportConfig;
pub use errors::{ExportError, Result};
pub use session::{ExportSession, ObjectDescriptor, ObjectKind};
pub use stage::Stage;
