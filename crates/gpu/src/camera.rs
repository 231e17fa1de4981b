use foundation::math::{Mat4, Vec2, Vec3, mat4_look_at_rh, mat4_mul, mat4_perspective_rh_z0};
use scene::picking::Ray;

pub const MIN_DISTANCE: f64 = 1.5;
pub const MAX_DISTANCE: f64 = 8.0;
pub const NEAR: f64 = 0.1;
pub const FAR: f64 = 1000.0;

/// Camera framing for a viewport width class.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraProfile {
    pub distance: f64,
    pub fov_y_deg: f64,
}

impl CameraProfile {
    pub const PHONE: CameraProfile = CameraProfile {
        distance: 4.2,
        fov_y_deg: 75.0,
    };
    pub const TABLET: CameraProfile = CameraProfile {
        distance: 3.6,
        fov_y_deg: 72.0,
    };
    pub const DESKTOP: CameraProfile = CameraProfile {
        distance: 3.0,
        fov_y_deg: 70.0,
    };

    /// Narrow screens pull the camera back and widen the lens so the whole
    /// globe stays in frame.
    pub fn for_viewport(width_px: f64) -> Self {
        if width_px < 640.0 {
            Self::PHONE
        } else if width_px < 1024.0 {
            Self::TABLET
        } else {
            Self::DESKTOP
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl PerspectiveCamera {
    /// Camera on +Z looking at the origin, framed for `width × height`.
    pub fn for_viewport(width_px: f64, height_px: f64) -> Self {
        let profile = CameraProfile::for_viewport(width_px);
        Self {
            position: Vec3::new(0.0, 0.0, profile.distance),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_rad: profile.fov_y_deg.to_radians(),
            aspect: aspect(width_px, height_px),
            near: NEAR,
            far: FAR,
        }
    }

    pub fn distance(&self) -> f64 {
        (self.position - self.target).length()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        mat4_look_at_rh(self.position, self.target, self.up)
    }

    pub fn proj_matrix(&self) -> Mat4 {
        mat4_perspective_rh_z0(self.fov_y_rad, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        mat4_mul(self.proj_matrix(), self.view_matrix())
    }

    /// World-space ray through a point in normalized device coordinates.
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Option<Ray> {
        let f = (self.target - self.position).try_normalize()?;
        let r = f.cross(self.up).try_normalize()?;
        let u = r.cross(f);
        let tan_half = (self.fov_y_rad * 0.5).tan();
        let dir = f + r * (ndc.x * tan_half * self.aspect) + u * (ndc.y * tan_half);
        Some(Ray::new(self.position, dir.try_normalize()?))
    }

    /// Inverse of [`ray_from_ndc`](Self::ray_from_ndc). `None` behind the eye.
    pub fn project_to_ndc(&self, p: Vec3) -> Option<Vec2> {
        let m = self.view_proj();
        let (x, y, z) = (p.x as f32, p.y as f32, p.z as f32);
        let clip_x = m[0][0] * x + m[1][0] * y + m[2][0] * z + m[3][0];
        let clip_y = m[0][1] * x + m[1][1] * y + m[2][1] * z + m[3][1];
        let clip_w = m[0][3] * x + m[1][3] * y + m[2][3] * z + m[3][3];
        if clip_w <= f32::EPSILON {
            return None;
        }
        Some(Vec2::new((clip_x / clip_w) as f64, (clip_y / clip_w) as f64))
    }
}

fn aspect(width_px: f64, height_px: f64) -> f64 {
    width_px.max(1.0) / height_px.max(1.0)
}

/// Pointer position relative to an element's bounding box → NDC (+Y up).
pub fn ndc_from_pointer(pointer: Vec2, origin: Vec2, size: Vec2) -> Option<Vec2> {
    if size.x <= 0.0 || size.y <= 0.0 {
        return None;
    }
    Some(Vec2::new(
        (pointer.x - origin.x) / size.x * 2.0 - 1.0,
        -((pointer.y - origin.y) / size.y) * 2.0 + 1.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::{CameraProfile, PerspectiveCamera, ndc_from_pointer};
    use foundation::math::{Vec2, Vec3};

    #[test]
    fn breakpoints() {
        assert_eq!(CameraProfile::for_viewport(375.0), CameraProfile::PHONE);
        assert_eq!(CameraProfile::for_viewport(639.9), CameraProfile::PHONE);
        assert_eq!(CameraProfile::for_viewport(640.0), CameraProfile::TABLET);
        assert_eq!(CameraProfile::for_viewport(1023.0), CameraProfile::TABLET);
        assert_eq!(CameraProfile::for_viewport(1440.0), CameraProfile::DESKTOP);
    }

    #[test]
    fn pointer_to_ndc() {
        let origin = Vec2::new(100.0, 50.0);
        let size = Vec2::new(200.0, 100.0);
        assert_eq!(
            ndc_from_pointer(Vec2::new(200.0, 100.0), origin, size),
            Some(Vec2::new(0.0, 0.0))
        );
        assert_eq!(
            ndc_from_pointer(Vec2::new(100.0, 50.0), origin, size),
            Some(Vec2::new(-1.0, 1.0))
        );
        assert_eq!(ndc_from_pointer(Vec2::new(0.0, 0.0), origin, Vec2::new(0.0, 10.0)), None);
    }

    #[test]
    fn center_ray_points_at_target() {
        let cam = PerspectiveCamera::for_viewport(1280.0, 720.0);
        let ray = cam.ray_from_ndc(Vec2::new(0.0, 0.0)).unwrap();
        assert!((ray.dir - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-12);
        assert_eq!(ray.origin, cam.position);
    }

    #[test]
    fn corner_ray_projects_back_to_corner() {
        let cam = PerspectiveCamera::for_viewport(1280.0, 720.0);
        let ray = cam.ray_from_ndc(Vec2::new(1.0, 1.0)).unwrap();
        let ndc = cam.project_to_ndc(ray.at(5.0)).unwrap();
        assert!((ndc.x - 1.0).abs() < 1e-4, "x = {}", ndc.x);
        assert!((ndc.y - 1.0).abs() < 1e-4, "y = {}", ndc.y);

        assert_eq!(cam.project_to_ndc(Vec3::new(0.0, 0.0, 10.0)), None);
    }
}
