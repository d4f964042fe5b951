use glam::{DMat4, Mat3, Mat4, Quat, Vec3};

/// Rigid pose of a simulated element: an orientation matrix and a translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Mat3,
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Mat3::IDENTITY,
        }
    }

    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation: Mat3::from_quat(rotation),
        }
    }

    /// Orientation followed by translation, column-vector convention.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation) * Mat4::from_mat3(self.rotation)
    }

    /// Double precision matrix as stored by `matrix4d` document attributes.
    pub fn to_dmat4(&self) -> DMat4 {
        DMat4::from_cols_array(&self.to_matrix().to_cols_array().map(f64::from))
    }
}

/// Simulators hand out orientations as nine row-major floats.
pub fn orientation_from_row_major(xmat: [f32; 9]) -> Mat3 {
    Mat3::from_cols_array(&xmat).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn translation_lands_in_last_column() {
        let transform = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let matrix = transform.to_matrix();
        assert_eq!(matrix.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(matrix.w_axis.w, 1.0);
    }

    #[test]
    fn rotation_is_applied_before_translation() {
        let transform = Transform::from_translation_rotation(
            Vec3::new(0.0, 0.0, 5.0),
            Quat::from_rotation_z(FRAC_PI_2),
        );
        let point = transform.to_matrix().transform_point3(Vec3::X);
        assert!((point - Vec3::new(0.0, 1.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn row_major_orientation_is_transposed() {
        // 90 degrees about Z, written row by row
        let xmat = [0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let rotation = orientation_from_row_major(xmat);
        let rotated = rotation * Vec3::X;
        assert!((rotated - Vec3::Y).length() < 1e-6);
    }
}
