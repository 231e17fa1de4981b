use foundation::math::{Mat4, Quat, Vec3, mat4_from_trs};

/// Local transform relative to the parent entity (or the world for roots).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn translate(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_uniform_scale(self, s: f64) -> Self {
        self.with_scale(Vec3::splat(s))
    }

    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.rotation.rotate(p.mul_elements(self.scale)) + self.position
    }

    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.rotation.rotate(v.mul_elements(self.scale))
    }

    /// `parent * self`: place this local transform inside `parent`.
    ///
    /// Non-uniform parent scale is not propagated through child rotations;
    /// the globe hierarchy only uses uniform scale on parents.
    pub fn compose(parent: &Transform, child: &Transform) -> Transform {
        Transform {
            position: parent.transform_point(child.position),
            rotation: parent.rotation.mul(child.rotation).normalize(),
            scale: parent.scale.mul_elements(child.scale),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        mat4_from_trs(self.position, self.rotation, self.scale)
    }
}
