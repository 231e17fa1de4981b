//! Column-major 4x4 matrices in the layout WGSL expects.

use super::{Quat, Vec3};

pub type Mat4 = [[f32; 4]; 4];

pub const MAT4_IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Column-major matrix multiply: `c = a * b`.
pub fn mat4_mul(a: Mat4, b: Mat4) -> Mat4 {
    let mut c = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            c[col][row] = a[0][row] * b[col][0]
                + a[1][row] * b[col][1]
                + a[2][row] * b[col][2]
                + a[3][row] * b[col][3];
        }
    }
    c
}

/// Right-handed perspective projection with depth range `[0, 1]`.
pub fn mat4_perspective_rh_z0(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Mat4 {
    let f = 1.0 / (0.5 * fov_y_rad).tan();
    let m00 = (f / aspect) as f32;
    let m11 = f as f32;
    let m22 = (far / (near - far)) as f32;
    let m23 = ((near * far) / (near - far)) as f32;

    [
        [m00, 0.0, 0.0, 0.0],
        [0.0, m11, 0.0, 0.0],
        [0.0, 0.0, m22, -1.0],
        [0.0, 0.0, m23, 0.0],
    ]
}

pub fn mat4_look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let f = (target - eye).normalize_or_zero();
    let s = f.cross(up).normalize_or_zero();
    let u = s.cross(f);

    let ex = -s.dot(eye);
    let ey = -u.dot(eye);
    let ez = f.dot(eye);

    [
        [s.x as f32, u.x as f32, (-f.x) as f32, 0.0],
        [s.y as f32, u.y as f32, (-f.y) as f32, 0.0],
        [s.z as f32, u.z as f32, (-f.z) as f32, 0.0],
        [ex as f32, ey as f32, ez as f32, 1.0],
    ]
}

/// Translation * rotation * scale.
pub fn mat4_from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    let x = rotation.rotate(Vec3::X) * scale.x;
    let y = rotation.rotate(Vec3::Y) * scale.y;
    let z = rotation.rotate(Vec3::Z) * scale.z;
    [
        [x.x as f32, x.y as f32, x.z as f32, 0.0],
        [y.x as f32, y.y as f32, y.z as f32, 0.0],
        [z.x as f32, z.y as f32, z.z as f32, 0.0],
        [
            translation.x as f32,
            translation.y as f32,
            translation.z as f32,
            1.0,
        ],
    ]
}

#[cfg(test)]
pub fn mat4_transform_point(m: Mat4, p: Vec3) -> Vec3 {
    let (x, y, z) = (p.x as f32, p.y as f32, p.z as f32);
    let out = [
        m[0][0] * x + m[1][0] * y + m[2][0] * z + m[3][0],
        m[0][1] * x + m[1][1] * y + m[2][1] * z + m[3][1],
        m[0][2] * x + m[1][2] * y + m[2][2] * z + m[3][2],
    ];
    Vec3::new(out[0] as f64, out[1] as f64, out[2] as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-5, "expected {a} ~= {b}");
    }

    #[test]
    fn identity_is_neutral() {
        let m = mat4_from_trs(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::ONE);
        assert_eq!(mat4_mul(MAT4_IDENTITY, m), m);
        assert_eq!(mat4_mul(m, MAT4_IDENTITY), m);
    }

    #[test]
    fn trs_applies_scale_then_rotation_then_translation() {
        let m = mat4_from_trs(
            Vec3::new(0.0, 0.0, 5.0),
            Quat::from_rotation_z(std::f64::consts::FRAC_PI_2),
            Vec3::new(2.0, 1.0, 1.0),
        );
        let p = mat4_transform_point(m, Vec3::X);
        assert_close(p.x, 0.0);
        assert_close(p.y, 2.0);
        assert_close(p.z, 5.0);
    }

    #[test]
    fn look_at_moves_target_onto_negative_z() {
        let view = mat4_look_at_rh(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y);
        let p = mat4_transform_point(view, Vec3::ZERO);
        assert_close(p.x, 0.0);
        assert_close(p.y, 0.0);
        assert_close(p.z, -3.0);
    }
}
