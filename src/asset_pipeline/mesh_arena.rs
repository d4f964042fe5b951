use std::ops::Range;

use glam::{Vec2, Vec3};

use crate::errors::{ExportError, Result};
use crate::geometry::GeometrySlice;

/// Flat mesh arrays exactly as a simulator lays them out: every asset's data
/// concatenated, addressed by per-asset start offsets.
///
/// Offsets are in elements (vertices, faces, UV coordinates), not floats.
/// Face indices are local to the asset's vertex range and face-UV indices are
/// local to its UV range.
#[derive(Debug, Clone, Default)]
pub struct MeshArrays {
    pub vert: Vec<f32>,
    pub vertadr: Vec<usize>,
    pub face: Vec<u32>,
    pub faceadr: Vec<usize>,
    pub facenum: Vec<usize>,
    pub texcoord: Vec<f32>,
    pub texcoordadr: Vec<usize>,
    pub facetexcoord: Vec<u32>,
}

/// Read-only arena holding the geometry of every mesh asset in a scene.
#[derive(Debug, Clone, Default)]
pub struct MeshAssetArena {
    arrays: MeshArrays,
    face_uv_ranges: Vec<usize>,
}

fn check_offsets(name: &str, offsets: &[usize], total: usize) -> Result<()> {
    if offsets.windows(2).any(|pair| pair[0] > pair[1]) {
        return Err(ExportError::InvalidArena(format!(
            "{name} offsets are not monotonic"
        )));
    }

    if let Some(&last) = offsets.last() {
        if last > total {
            return Err(ExportError::InvalidArena(format!(
                "{name} offset {last} exceeds array length {total}"
            )));
        }
    }

    Ok(())
}

/// `facenum` sizes the face-UV ranges, `faceadr` the face ranges; both must
/// describe the same faces.
fn check_face_counts(faceadr: &[usize], facenum: &[usize], total: usize) -> Result<()> {
    for (asset_id, &count) in facenum.iter().enumerate() {
        let expected = asset_range(faceadr, asset_id, total).len();
        if count != expected {
            return Err(ExportError::InvalidArena(format!(
                "asset {asset_id} has facenum {count} but {expected} faces"
            )));
        }
    }

    Ok(())
}

fn check_stride(name: &str, len: usize, stride: usize) -> Result<()> {
    if len % stride != 0 {
        return Err(ExportError::InvalidArena(format!(
            "{name} length {len} is not a multiple of {stride}"
        )));
    }

    Ok(())
}

/// Start of each asset's face-UV indices in the flattened index array, plus
/// the end of the last one. Three indices per face.
pub fn face_uv_ranges(facenum: &[usize]) -> Vec<usize> {
    let mut ranges = Vec::with_capacity(facenum.len() + 1);
    let mut running_sum = 0;
    ranges.push(running_sum);
    for &faces in facenum {
        running_sum += faces * 3;
        ranges.push(running_sum);
    }
    ranges
}

/// Upstream marks faces without UVs with an index one past the asset's last
/// UV coordinate. Those are pointed at UV 0 instead.
pub fn remap_unset_uv_indices(indices: &mut [u32], uv_count: usize) {
    for index in indices.iter_mut() {
        if *index as usize == uv_count {
            *index = 0;
        }
    }
}

fn asset_range(offsets: &[usize], asset_id: usize, total: usize) -> Range<usize> {
    let start = offsets[asset_id];
    let end = offsets.get(asset_id + 1).copied().unwrap_or(total);
    start..end
}

impl MeshAssetArena {
    pub fn new(arrays: MeshArrays) -> Result<Self> {
        check_stride("vert", arrays.vert.len(), 3)?;
        check_stride("face", arrays.face.len(), 3)?;
        check_stride("texcoord", arrays.texcoord.len(), 2)?;
        check_stride("facetexcoord", arrays.facetexcoord.len(), 3)?;

        let asset_count = arrays.vertadr.len();
        if [
            arrays.faceadr.len(),
            arrays.facenum.len(),
            arrays.texcoordadr.len(),
        ]
        .iter()
        .any(|&len| len != asset_count)
        {
            return Err(ExportError::InvalidArena(
                "per-asset tables disagree on the asset count".to_string(),
            ));
        }

        check_offsets("vertadr", &arrays.vertadr, arrays.vert.len() / 3)?;
        check_offsets("faceadr", &arrays.faceadr, arrays.face.len() / 3)?;
        check_offsets("texcoordadr", &arrays.texcoordadr, arrays.texcoord.len() / 2)?;
        check_face_counts(&arrays.faceadr, &arrays.facenum, arrays.face.len() / 3)?;

        let face_uv_ranges = face_uv_ranges(&arrays.facenum);
        let face_uv_total = face_uv_ranges.last().copied().unwrap_or(0);
        if face_uv_total > arrays.facetexcoord.len() {
            return Err(ExportError::InvalidArena(format!(
                "facenum covers {face_uv_total} face UV indices, only {} present",
                arrays.facetexcoord.len()
            )));
        }

        Ok(Self {
            arrays,
            face_uv_ranges,
        })
    }

    /// Packs individual meshes into one arena, in order.
    pub fn bake(assets: &[GeometrySlice]) -> Result<Self> {
        let mut arrays = MeshArrays::default();

        for (asset_id, asset) in assets.iter().enumerate() {
            if asset.face_uv_indices.len() != asset.faces.len() * 3 {
                return Err(ExportError::InvalidArena(format!(
                    "asset {asset_id} has {} faces but {} face UV indices",
                    asset.faces.len(),
                    asset.face_uv_indices.len()
                )));
            }

            arrays.vertadr.push(arrays.vert.len() / 3);
            arrays.faceadr.push(arrays.face.len() / 3);
            arrays.facenum.push(asset.faces.len());
            arrays.texcoordadr.push(arrays.texcoord.len() / 2);

            arrays
                .vert
                .extend_from_slice(bytemuck::cast_slice(&asset.vertices));
            arrays.face.extend_from_slice(bytemuck::cast_slice(&asset.faces));
            arrays
                .texcoord
                .extend_from_slice(bytemuck::cast_slice(&asset.uv_coords));
            arrays.facetexcoord.extend_from_slice(&asset.face_uv_indices);
        }

        Self::new(arrays)
    }

    pub fn asset_count(&self) -> usize {
        self.arrays.vertadr.len()
    }

    pub fn total_vertices(&self) -> usize {
        self.arrays.vert.len() / 3
    }

    pub fn total_faces(&self) -> usize {
        self.arrays.face.len() / 3
    }

    pub fn total_uv_coords(&self) -> usize {
        self.arrays.texcoord.len() / 2
    }

    pub fn vertex_range(&self, asset_id: usize) -> Result<Range<usize>> {
        self.check_asset(asset_id)?;
        Ok(asset_range(
            &self.arrays.vertadr,
            asset_id,
            self.total_vertices(),
        ))
    }

    fn check_asset(&self, asset_id: usize) -> Result<()> {
        if asset_id >= self.asset_count() {
            return Err(ExportError::InvalidAssetId {
                asset_id,
                asset_count: self.asset_count(),
            });
        }

        Ok(())
    }

    /// Copies out the vertices, faces and UVs belonging to one asset.
    pub fn slice(&self, asset_id: usize) -> Result<GeometrySlice> {
        let vertex_range = self.vertex_range(asset_id)?;
        let face_range = asset_range(&self.arrays.faceadr, asset_id, self.total_faces());
        let uv_range = asset_range(
            &self.arrays.texcoordadr,
            asset_id,
            self.total_uv_coords(),
        );

        let vertices: &[Vec3] = bytemuck::cast_slice(
            &self.arrays.vert[vertex_range.start * 3..vertex_range.end * 3],
        );
        let faces: &[[u32; 3]] =
            bytemuck::cast_slice(&self.arrays.face[face_range.start * 3..face_range.end * 3]);
        let uv_coords: &[Vec2] =
            bytemuck::cast_slice(&self.arrays.texcoord[uv_range.start * 2..uv_range.end * 2]);

        let face_uv_range = self.face_uv_ranges[asset_id]..self.face_uv_ranges[asset_id + 1];
        let mut face_uv_indices = self.arrays.facetexcoord[face_uv_range].to_vec();
        remap_unset_uv_indices(&mut face_uv_indices, uv_coords.len());

        Ok(GeometrySlice {
            vertices: vertices.to_vec(),
            faces: faces.to_vec(),
            uv_coords: uv_coords.to_vec(),
            face_uv_indices,
        })
    }
}
