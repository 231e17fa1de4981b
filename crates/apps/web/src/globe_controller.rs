//! Orbit controller for the news globe: arcball drag with inertia, hover-gated
//! wheel zoom and right-drag pan, and viewport-driven framing.

use std::collections::VecDeque;

use foundation::math::{Quat, Vec2, Vec3};
use gpu::camera::{CameraProfile, MAX_DISTANCE, MIN_DISTANCE, PerspectiveCamera};

/// Angular velocity decay (per second).
const ANGULAR_DAMPING: f64 = 4.0;

/// Inertia stops below this rate (rad/s).
const ANGULAR_VELOCITY_THRESHOLD: f64 = 0.01;

const ZOOM_SMOOTHING: f64 = 8.0;

const VELOCITY_HISTORY_SIZE: usize = 5;

/// Pan offset is kept inside the globe so the view cannot lose it.
const MAX_PAN: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragButton {
    #[default]
    None,
    Rotate,
    Pan,
}

#[derive(Debug, Clone, Copy)]
struct VelocitySample {
    delta: Quat,
    dt: f64,
}

#[derive(Debug, Clone)]
pub struct GlobeController {
    /// Camera frame around the target; identity looks down -Z from +Z.
    orientation: Quat,
    distance: f64,
    target_distance: f64,
    target: Vec3,
    fov_y_rad: f64,

    /// Local-frame spin axis and rate (rad/s) left over from a drag.
    spin_axis: Vec3,
    spin_rate: f64,
    inertia_active: bool,

    canvas_width: f64,
    canvas_height: f64,

    /// Latest hit-test verdict; gates zoom and pan.
    pointer_over_globe: bool,

    drag: DragButton,
    last_pos_px: Vec2,
    arcball_last: Option<Vec3>,
    velocity_history: VecDeque<VelocitySample>,
    last_sample_s: f64,
}

impl Default for GlobeController {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

impl GlobeController {
    pub fn new(width_px: f64, height_px: f64) -> Self {
        let profile = CameraProfile::for_viewport(width_px);
        Self {
            orientation: Quat::IDENTITY,
            distance: profile.distance,
            target_distance: profile.distance,
            target: Vec3::ZERO,
            fov_y_rad: profile.fov_y_deg.to_radians(),
            spin_axis: Vec3::Y,
            spin_rate: 0.0,
            inertia_active: false,
            canvas_width: width_px.max(1.0),
            canvas_height: height_px.max(1.0),
            pointer_over_globe: false,
            drag: DragButton::None,
            last_pos_px: Vec2::default(),
            arcball_last: None,
            velocity_history: VecDeque::with_capacity(VELOCITY_HISTORY_SIZE),
            last_sample_s: 0.0,
        }
    }

    /// Resize: new aspect, and the breakpoint's distance and field of view.
    pub fn set_viewport(&mut self, width_px: f64, height_px: f64) {
        let profile = CameraProfile::for_viewport(width_px);
        self.canvas_width = width_px.max(1.0);
        self.canvas_height = height_px.max(1.0);
        self.fov_y_rad = profile.fov_y_deg.to_radians();
        self.set_distance(profile.distance);
    }

    pub fn set_pointer_over_globe(&mut self, over: bool) {
        self.pointer_over_globe = over;
    }

    pub fn pointer_over_globe(&self) -> bool {
        self.pointer_over_globe
    }

    /// `button` follows `MouseEvent.button`: 0 left, 1 middle, 2 right.
    pub fn on_pointer_down(&mut self, pos_px: Vec2, button: i16, now_s: f64) {
        self.stop_inertia();

        self.drag = match button {
            1 | 2 if self.pointer_over_globe => DragButton::Pan,
            1 | 2 => DragButton::None,
            _ => DragButton::Rotate,
        };
        self.last_pos_px = pos_px;
        self.last_sample_s = now_s;
        self.arcball_last = Some(self.screen_to_arcball(pos_px));
    }

    pub fn on_pointer_move(&mut self, pos_px: Vec2, now_s: f64) {
        match self.drag {
            DragButton::None => {}
            DragButton::Rotate => self.rotate_to(pos_px, now_s),
            DragButton::Pan => self.pan_by(pos_px - self.last_pos_px),
        }
        self.last_pos_px = pos_px;
    }

    pub fn on_pointer_up(&mut self) {
        if self.drag == DragButton::Rotate {
            let (axis, rate) = self.estimate_angular_velocity();
            self.spin_axis = axis;
            self.spin_rate = rate;
            self.inertia_active = rate > ANGULAR_VELOCITY_THRESHOLD;
        }
        self.drag = DragButton::None;
        self.arcball_last = None;
        self.velocity_history.clear();
    }

    #[cfg(test)]
    pub fn is_dragging(&self) -> bool {
        self.drag != DragButton::None
    }

    /// Exponential wheel zoom. Returns `false` (event not consumed, let the
    /// page scroll) unless the pointer is over the globe.
    pub fn on_wheel(&mut self, delta_y: f64) -> bool {
        if !self.pointer_over_globe {
            return false;
        }
        self.inertia_active = false;
        let zoom_factor = (delta_y * 0.002).exp();
        self.target_distance = (self.target_distance * zoom_factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        true
    }

    pub fn update(&mut self, dt: f64) {
        let dt = dt.clamp(0.0, 0.1);

        if self.inertia_active && self.drag == DragButton::None {
            let step = Quat::from_axis_angle(self.spin_axis, self.spin_rate * dt);
            self.orientation = self.orientation.mul(step).normalize();
            self.spin_rate *= (-ANGULAR_DAMPING * dt).exp();
            if self.spin_rate < ANGULAR_VELOCITY_THRESHOLD {
                self.stop_inertia();
            }
        }

        let zoom_alpha = 1.0 - (-ZOOM_SMOOTHING * dt).exp();
        self.distance += (self.target_distance - self.distance) * zoom_alpha;
        self.distance = self.distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn eye_position(&self) -> Vec3 {
        self.target + self.orientation.rotate(Vec3::Z * self.distance)
    }

    pub fn camera(&self) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::for_viewport(self.canvas_width, self.canvas_height);
        camera.position = self.eye_position();
        camera.target = self.target;
        camera.up = self.orientation.rotate(Vec3::Y);
        camera.fov_y_rad = self.fov_y_rad;
        camera
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn target_distance(&self) -> f64 {
        self.target_distance
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    #[cfg(test)]
    pub fn is_inertia_active(&self) -> bool {
        self.inertia_active
    }

    pub fn set_distance(&mut self, distance: f64) {
        let clamped = distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.distance = clamped;
        self.target_distance = clamped;
    }

    pub fn stop_inertia(&mut self) {
        self.inertia_active = false;
        self.spin_rate = 0.0;
        self.velocity_history.clear();
    }

    fn rotate_to(&mut self, pos_px: Vec2, now_s: f64) {
        let dt = (now_s - self.last_sample_s).max(1e-6);
        self.last_sample_s = now_s;

        let next = self.screen_to_arcball(pos_px);
        if let Some(prev) = self.arcball_last {
            // The surface follows the pointer, so the camera turns the other way.
            let delta = Quat::from_unit_vectors(prev, next).conjugate();
            self.orientation = self.orientation.mul(delta).normalize();

            self.velocity_history.push_back(VelocitySample { delta, dt });
            if self.velocity_history.len() > VELOCITY_HISTORY_SIZE {
                self.velocity_history.pop_front();
            }
        }
        self.arcball_last = Some(next);
    }

    fn pan_by(&mut self, delta_px: Vec2) {
        let world_per_px =
            2.0 * self.distance * (self.fov_y_rad * 0.5).tan() / self.canvas_height;
        let right = self.orientation.rotate(Vec3::X);
        let up = self.orientation.rotate(Vec3::Y);
        let moved = self.target - right * (delta_px.x * world_per_px) + up * (delta_px.y * world_per_px);
        let len = moved.length();
        self.target = if len > MAX_PAN {
            moved * (MAX_PAN / len)
        } else {
            moved
        };
    }

    fn screen_to_arcball(&self, pos_px: Vec2) -> Vec3 {
        let min_dim = self.canvas_width.min(self.canvas_height).max(1.0);
        let nx = (2.0 * pos_px.x - self.canvas_width) / min_dim;
        let ny = (self.canvas_height - 2.0 * pos_px.y) / min_dim;

        let r2 = nx * nx + ny * ny;
        if r2 <= 1.0 {
            Vec3::new(nx, ny, (1.0 - r2).sqrt()).normalize_or_zero()
        } else {
            let inv_r = 1.0 / r2.sqrt();
            Vec3::new(nx * inv_r, ny * inv_r, 0.0)
        }
    }

    /// Mean local-frame rotation over the recent drag samples, as axis and
    /// rad/s.
    fn estimate_angular_velocity(&self) -> (Vec3, f64) {
        let mut total_dt = 0.0;
        let mut accumulated = Quat::IDENTITY;
        for sample in &self.velocity_history {
            accumulated = accumulated.mul(sample.delta);
            total_dt += sample.dt;
        }
        if total_dt <= 0.0 {
            return (Vec3::Y, 0.0);
        }
        // Shortest arc: angle in [0, π].
        let accumulated = if accumulated.w < 0.0 {
            Quat::from_array(accumulated.to_array().map(|c| -c))
        } else {
            accumulated
        };
        let Some(axis) = Vec3::new(accumulated.x, accumulated.y, accumulated.z).try_normalize()
        else {
            return (Vec3::Y, 0.0);
        };
        (axis, accumulated.angle() / total_dt)
    }
}

/// Current wall time in seconds.
pub fn now_seconds() -> f64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now() / 1000.0
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}
