//! Math type aliases and helper functions.
//!
//! Thin f32 aliases over `nalgebra` plus the handful of transform helpers
//! the converter needs: TRS composition, column-major matrix loading, and
//! quaternion/Euler conversion for baked animation tracks.

pub use nalgebra;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Quaternion (f32). Stored as `[x, y, z, w]` in memory.
/// Use [`quat_from_array`] or `Quaternion::new(w, x, y, z)` to construct.
pub type Quat = nalgebra::Quaternion<f32>;

/// Build a 4x4 TRS matrix from scale, rotation (quaternion), and translation.
pub fn mat4_from_scale_rotation_translation(
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
) -> Mat4 {
    let r = nalgebra::UnitQuaternion::new_normalize(rotation);
    let m = r.to_rotation_matrix();
    let rm = m.matrix();
    #[rustfmt::skip]
    let result = Mat4::new(
        rm[(0, 0)] * scale.x, rm[(0, 1)] * scale.y, rm[(0, 2)] * scale.z, translation.x,
        rm[(1, 0)] * scale.x, rm[(1, 1)] * scale.y, rm[(1, 2)] * scale.z, translation.y,
        rm[(2, 0)] * scale.x, rm[(2, 1)] * scale.y, rm[(2, 2)] * scale.z, translation.z,
        0.0,                  0.0,                  0.0,                  1.0,
    );
    result
}

/// Load a 4x4 matrix from a column-major 16-element slice.
pub fn mat4_from_column_slice(values: &[f32]) -> Mat4 {
    Mat4::from_column_slice(values)
}

/// Create a quaternion from a `[x, y, z, w]` array.
pub fn quat_from_array(a: [f32; 4]) -> Quat {
    nalgebra::Quaternion::new(a[3], a[0], a[1], a[2])
}

/// Convert a quaternion to Euler angles in degrees, `[x, y, z]` order
/// (roll, pitch, yaw). This is the rotation representation baked animation
/// tracks use.
pub fn quat_to_euler_deg(q: Quat) -> [f32; 3] {
    let (roll, pitch, yaw) = nalgebra::UnitQuaternion::new_normalize(q).euler_angles();
    [roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees()]
}

/// Decompose a 4x4 matrix into (scale, rotation, translation).
///
/// Scale components come back non-negative; use [`mat4_mirrors`] to detect
/// a mirroring transform.
pub fn to_scale_rotation_translation(m: &Mat4) -> (Vec3, Quat, Vec3) {
    let translation = Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
    let col0 = Vec3::new(m[(0, 0)], m[(1, 0)], m[(2, 0)]);
    let col1 = Vec3::new(m[(0, 1)], m[(1, 1)], m[(2, 1)]);
    let col2 = Vec3::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]);
    let sx = col0.norm();
    let sy = col1.norm();
    let sz = col2.norm();
    let scale = Vec3::new(sx, sy, sz);
    let rot_mat = nalgebra::Matrix3::from_columns(&[col0 / sx, col1 / sy, col2 / sz]);
    let rotation = nalgebra::UnitQuaternion::from_rotation_matrix(
        &nalgebra::Rotation3::from_matrix_unchecked(rot_mat),
    )
    .into_inner();
    (scale, rotation, translation)
}

/// Whether a transform mirrors geometry: an odd number of negative scale
/// components, detected through the sign of the upper 3x3 determinant.
pub fn mat4_mirrors(m: &Mat4) -> bool {
    let det = m.fixed_view::<3, 3>(0, 0).determinant();
    det < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_trs_matrix() {
        let m = mat4_from_scale_rotation_translation(
            Vec3::new(1.0, 1.0, 1.0),
            Quat::identity(),
            Vec3::zeros(),
        );
        assert!((m - Mat4::identity()).norm() < 1e-6);
    }

    #[test]
    fn column_slice_roundtrip() {
        let values: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let m = mat4_from_column_slice(&values);
        assert_eq!(m[(0, 0)], 0.0);
        assert_eq!(m[(1, 0)], 1.0);
        assert_eq!(m[(0, 1)], 4.0);
        assert_eq!(m[(3, 3)], 15.0);
    }

    #[test]
    fn euler_of_quarter_yaw() {
        let q = nalgebra::UnitQuaternion::from_axis_angle(
            &nalgebra::Vector3::z_axis(),
            FRAC_PI_2,
        )
        .into_inner();
        let e = quat_to_euler_deg(q);
        assert!(e[0].abs() < 1e-4);
        assert!(e[1].abs() < 1e-4);
        assert!((e[2] - 90.0).abs() < 1e-3);
    }

    #[test]
    fn decompose_trs_roundtrip() {
        let s = Vec3::new(2.0, 3.0, 4.0);
        let r = quat_from_array([0.0, 0.38268343, 0.0, 0.92387953]);
        let t = Vec3::new(5.0, 6.0, 7.0);
        let m = mat4_from_scale_rotation_translation(s, r, t);
        let (s2, _r2, t2) = to_scale_rotation_translation(&m);
        assert!((s - s2).norm() < 1e-4);
        assert!((t - t2).norm() < 1e-4);
    }

    #[test]
    fn mirror_detection() {
        let plain = mat4_from_scale_rotation_translation(
            Vec3::new(1.0, 1.0, 1.0),
            Quat::identity(),
            Vec3::zeros(),
        );
        assert!(!mat4_mirrors(&plain));

        let one_axis = mat4_from_scale_rotation_translation(
            Vec3::new(-1.0, 1.0, 1.0),
            Quat::identity(),
            Vec3::zeros(),
        );
        assert!(mat4_mirrors(&one_axis));

        // Two negative axes cancel out: no mirroring.
        let two_axes = mat4_from_scale_rotation_translation(
            Vec3::new(-1.0, -1.0, 1.0),
            Quat::identity(),
            Vec3::zeros(),
        );
        assert!(!mat4_mirrors(&two_axes));
    }
}
