//! Math types and transform helpers
//!
//! Host applications hand out double-precision world matrices; colors and
//! pixel data are single precision. Both conventions are fixed here.

pub use nalgebra::{Matrix4, Vector3, Vector4};

/// 4x4 transform matrix in the host's double-precision convention
pub type Mat4 = Matrix4<f64>;

/// RGB color value
pub type Color3 = Vector3<f32>;

/// Fixed orientation correction applied to area-light emitter geometry.
///
/// The renderer's default light-emitting plane faces along a different axis
/// than the host's, so every area-light instance transform is premultiplied
/// with a -90 degree rotation about the local X axis.
#[must_use]
pub fn area_light_prerotation() -> Mat4 {
    Matrix4::from_axis_angle(&Vector3::x_axis(), -std::f64::consts::FRAC_PI_2)
}

/// Translation component of a world matrix
#[must_use]
pub fn translation_of(matrix: &Mat4) -> Vector3<f64> {
    Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)])
}

/// A world-space direction obtained by transforming a local axis.
///
/// Returns the normalized result; a degenerate (zero-scale) matrix yields the
/// untransformed axis.
#[must_use]
pub fn transformed_direction(matrix: &Mat4, local: Vector3<f64>) -> Vector3<f64> {
    let dir = matrix.transform_vector(&local);
    if dir.norm_squared() > 0.0 {
        dir.normalize()
    } else {
        local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_area_light_prerotation_maps_y_to_negative_z() {
        // -90 degrees about X sends +Y to -Z
        let rotated = area_light_prerotation().transform_vector(&Vector3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_translation_of_reads_last_column() {
        let m = Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(translation_of(&m), Vector3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_transformed_direction_is_normalized() {
        let m = Matrix4::new_scaling(5.0);
        let dir = transformed_direction(&m, Vector3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(dir.norm(), 1.0, epsilon = 1e-12);
    }
}
