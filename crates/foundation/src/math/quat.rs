//! Unit quaternions for scene rotations.
//!
//! Storage order is `[x, y, z, w]`, matching the controller code that feeds
//! these into camera orbits.

use super::Vec3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quat {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn from_array(q: [f64; 4]) -> Self {
        Self {
            x: q[0],
            y: q[1],
            z: q[2],
            w: q[3],
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.w]
    }

    pub fn from_axis_angle(axis: Vec3, angle_rad: f64) -> Self {
        let axis = axis.normalize_or_zero();
        let half = angle_rad * 0.5;
        let s = half.sin();
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: half.cos(),
        }
    }

    pub fn from_rotation_y(angle_rad: f64) -> Self {
        Self::from_axis_angle(Vec3::Y, angle_rad)
    }

    pub fn from_rotation_z(angle_rad: f64) -> Self {
        Self::from_axis_angle(Vec3::Z, angle_rad)
    }

    /// Rotation taking unit vector `a` onto unit vector `b`.
    pub fn from_unit_vectors(a: Vec3, b: Vec3) -> Self {
        let dot = a.dot(b).clamp(-1.0, 1.0);

        // Nearly opposite vectors: pick an arbitrary orthogonal axis.
        if dot < -0.999_999 {
            let mut axis = Vec3::X.cross(a);
            if axis.dot(axis) < 1e-12 {
                axis = Vec3::Y.cross(a);
            }
            let axis = axis.normalize_or_zero();
            return Self {
                x: axis.x,
                y: axis.y,
                z: axis.z,
                w: 0.0,
            };
        }

        if dot > 0.999_999 {
            return Self::IDENTITY;
        }

        let axis = a.cross(b);
        Self {
            x: axis.x,
            y: axis.y,
            z: axis.z,
            w: 1.0 + dot,
        }
        .normalize()
    }

    /// Hamilton product `self * rhs` (apply `rhs` first).
    pub fn mul(self, rhs: Self) -> Self {
        let a = self;
        let b = rhs;
        Self {
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        }
    }

    pub fn normalize(self) -> Self {
        let n = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if n > 1e-10 {
            Self {
                x: self.x / n,
                y: self.y / n,
                z: self.z / n,
                w: self.w / n,
            }
        } else {
            Self::IDENTITY
        }
    }

    /// Inverse of a unit quaternion.
    pub fn conjugate(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: self.w,
        }
    }

    pub fn rotate(self, v: Vec3) -> Vec3 {
        let qv = Vec3::new(self.x, self.y, self.z);
        let t = qv.cross(v) * 2.0;
        v + t * self.w + qv.cross(t)
    }

    /// Rotation angle in radians, in `[0, 2π]`.
    pub fn angle(self) -> f64 {
        2.0 * self.w.clamp(-1.0, 1.0).acos()
    }

    #[cfg(test)]
    pub fn slerp(self, other: Self, t: f64) -> Self {
        let a = self;
        let mut b = other;
        let mut dot = a.x * b.x + a.y * b.y + a.z * b.z + a.w * b.w;

        // Take the shorter path.
        if dot < 0.0 {
            b = Self {
                x: -b.x,
                y: -b.y,
                z: -b.z,
                w: -b.w,
            };
            dot = -dot;
        }

        if dot > 0.9995 {
            return Self {
                x: a.x + t * (b.x - a.x),
                y: a.y + t * (b.y - a.y),
                z: a.z + t * (b.z - a.z),
                w: a.w + t * (b.w - a.w),
            }
            .normalize();
        }

        let theta_0 = dot.clamp(-1.0, 1.0).acos();
        let theta = theta_0 * t;
        let sin_theta = theta.sin();
        let sin_theta_0 = theta_0.sin();

        let s0 = theta.cos() - dot * sin_theta / sin_theta_0;
        let s1 = sin_theta / sin_theta_0;

        Self {
            x: s0 * a.x + s1 * b.x,
            y: s0 * a.y + s1 * b.y,
            z: s0 * a.z + s1 * b.z,
            w: s0 * a.w + s1 * b.w,
        }
    }
}
