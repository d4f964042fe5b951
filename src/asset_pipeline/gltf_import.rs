use std::path::Path;

use anyhow::{bail, Context};
use glam::{Vec2, Vec3};
use gltf::buffer;
use itertools::Itertools;

use crate::geometry::GeometrySlice;

pub type Buffers<'a> = &'a [buffer::Data];

/// A named mesh read from a glTF document, all primitives merged.
pub struct ImportedMesh {
    pub name: String,
    pub geometry: GeometrySlice,
}

impl ImportedMesh {
    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> anyhow::Result<ImportedMesh> {
        let mut imported = ImportedMesh {
            name: name.into(),
            geometry: GeometrySlice::default(),
        };

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                bail!(
                    "Unsupported primitive mode in {}: {:?}",
                    imported.name,
                    primitive.mode()
                );
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions = reader
                .read_positions()
                .with_context(|| format!("Mesh {} has a primitive without positions", imported.name))?
                .map(Vec3::from)
                .collect::<Vec<_>>();

            // Meshes without UVs still get one coordinate per vertex so the
            // face-UV indices can mirror the face indices.
            let tex_coords: Vec<Vec2> = match reader.read_tex_coords(0) {
                Some(tex_coords) => tex_coords.into_f32().map(Vec2::from).collect(),
                None => vec![Vec2::ZERO; positions.len()],
            };

            if tex_coords.len() != positions.len() {
                bail!(
                    "Mesh {} has {} positions but {} tex coords",
                    imported.name,
                    positions.len(),
                    tex_coords.len()
                );
            }

            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<u32>>(),
                None => (0..positions.len() as u32).collect(),
            };

            let geometry = &mut imported.geometry;
            let base = geometry.vertices.len() as u32;

            for (a, b, c) in indices.into_iter().tuples() {
                let face = [base + a, base + b, base + c];
                geometry.faces.push(face);
                geometry.face_uv_indices.extend(face);
            }

            geometry.vertices.extend(positions);
            geometry.uv_coords.extend(tex_coords);
        }

        if imported.geometry.faces.is_empty() {
            bail!("Mesh without triangles: {}", imported.name);
        }

        Ok(imported)
    }
}

/// Reads every mesh of a glTF file, in document order.
pub fn import_meshes(path: impl AsRef<Path>) -> anyhow::Result<Vec<ImportedMesh>> {
    let path = path.as_ref();
    let (document, buffers, _images) =
        gltf::import(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let meshes = document
        .meshes()
        .map(|mesh| {
            let name = mesh
                .name()
                .map(String::from)
                .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
            ImportedMesh::from_gltf(name, mesh, &buffers)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    log::info!("Imported {} meshes from {}", meshes.len(), path.display());

    Ok(meshes)
}
