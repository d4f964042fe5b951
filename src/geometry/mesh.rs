use glam::{Vec2, Vec3};

/// A triangle mesh as produced by the shape generators.
///
/// UVs are stored per triangle corner (`triangle_uvs.len() == 3 * triangles.len()`),
/// so no UV is ever shared between two faces.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub triangle_uvs: Vec<Vec2>,
}

impl TriangleMesh {
    pub fn face_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn push_vertex(&mut self, position: Vec3) -> u32 {
        self.vertices.push(position);
        (self.vertices.len() - 1) as u32
    }

    pub fn push_triangle(&mut self, indices: [u32; 3], uvs: [Vec2; 3]) {
        self.triangles.push(indices);
        self.triangle_uvs.extend(uvs);
    }

    /// Mean of the vertex positions.
    pub fn center(&self) -> Vec3 {
        if self.vertices.is_empty() {
            return Vec3::ZERO;
        }

        self.vertices.iter().copied().sum::<Vec3>() / self.vertices.len() as f32
    }

    pub fn translate(&mut self, offset: Vec3) {
        for vertex in &mut self.vertices {
            *vertex += offset;
        }
    }

    /// Moves the mesh so its vertex centroid sits at the origin.
    pub fn recenter(&mut self) {
        let center = self.center();
        self.translate(-center);
    }

    /// Negates Z and flips the winding so faces keep pointing outwards.
    pub fn mirror_z(&mut self) {
        for vertex in &mut self.vertices {
            vertex.z = -vertex.z;
        }

        for (triangle, uvs) in self
            .triangles
            .iter_mut()
            .zip(self.triangle_uvs.chunks_exact_mut(3))
        {
            triangle.swap(1, 2);
            uvs.swap(1, 2);
        }
    }
}

/// Geometry of one visual element, ready to be authored as a mesh node.
///
/// `face_uv_indices` is flattened (three entries per face) because the
/// document stores primvar indices flattened.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometrySlice {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
    pub uv_coords: Vec<Vec2>,
    pub face_uv_indices: Vec<u32>,
}

impl GeometrySlice {
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn face_vertex_counts(&self) -> Vec<i32> {
        vec![3; self.faces.len()]
    }

    pub fn face_vertex_indices(&self) -> Vec<i32> {
        self.faces.iter().flatten().map(|&index| index as i32).collect()
    }

    pub fn face_uv_indices_i32(&self) -> Vec<i32> {
        self.face_uv_indices
            .iter()
            .map(|&index| index as i32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> TriangleMesh {
        let mut mesh = TriangleMesh::default();
        let a = mesh.push_vertex(Vec3::new(0.0, 0.0, 1.0));
        let b = mesh.push_vertex(Vec3::new(3.0, 0.0, 1.0));
        let c = mesh.push_vertex(Vec3::new(0.0, 3.0, 1.0));
        mesh.push_triangle([a, b, c], [Vec2::ZERO, Vec2::X, Vec2::Y]);
        mesh
    }

    #[test]
    fn recenter_moves_centroid_to_origin() {
        let mut mesh = triangle();
        assert_eq!(mesh.center(), Vec3::new(1.0, 1.0, 1.0));
        mesh.recenter();
        assert!(mesh.center().length() < 1e-6);
    }

    #[test]
    fn mirror_z_flips_winding_and_uvs_together() {
        let mut mesh = triangle();
        mesh.mirror_z();
        assert_eq!(mesh.vertices[0].z, -1.0);
        assert_eq!(mesh.triangles[0], [0, 2, 1]);
        assert_eq!(mesh.triangle_uvs, vec![Vec2::ZERO, Vec2::Y, Vec2::X]);
    }

    #[test]
    fn slice_flattens_faces() {
        let slice = GeometrySlice {
            faces: vec![[0, 1, 2], [2, 1, 3]],
            ..Default::default()
        };
        assert_eq!(slice.face_vertex_counts(), vec![3, 3]);
        assert_eq!(slice.face_vertex_indices(), vec![0, 1, 2, 2, 1, 3]);
    }
}
