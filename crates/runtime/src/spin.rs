//! Auto-rotation for the globe group, clouds and starfield.
//!
//! Two states: the globe spins at a fixed per-frame increment, or it is
//! paused because the pointer rests on the globe or a marker.

/// Globe rotation per frame (radians).
pub const BASE_ROTATION_SPEED: f64 = 0.0004;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SpinState {
    #[default]
    Spinning,
    Paused,
}

/// Per-frame rotation increments for each rotating part of the scene.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RotationStep {
    pub globe: f64,
    pub clouds: f64,
    pub stars: f64,
}

impl RotationStep {
    pub fn from_speed(speed: f64) -> Self {
        Self {
            globe: speed,
            clouds: speed / 3.0,
            stars: -speed / 10.0,
        }
    }
}

/// Accumulated yaw (about +Y) of each rotating part.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rotations {
    pub globe_y: f64,
    pub clouds_y: f64,
    pub stars_y: f64,
}

impl Rotations {
    pub fn apply(&mut self, step: RotationStep) {
        self.globe_y += step.globe;
        self.clouds_y += step.clouds;
        self.stars_y += step.stars;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spin {
    state: SpinState,
    base_speed: f64,
}

impl Default for Spin {
    fn default() -> Self {
        Self::new(BASE_ROTATION_SPEED)
    }
}

impl Spin {
    pub fn new(base_speed: f64) -> Self {
        Self {
            state: SpinState::Spinning,
            base_speed,
        }
    }

    pub fn state(&self) -> SpinState {
        self.state
    }

    /// Feed the latest hit-test result.
    ///
    /// Returns the new state when it changed.
    pub fn update(&mut self, pointer_over_globe: bool) -> Option<SpinState> {
        let next = if pointer_over_globe {
            SpinState::Paused
        } else {
            SpinState::Spinning
        };
        if next == self.state {
            return None;
        }
        tracing::debug!(from = ?self.state, to = ?next, "spin state change");
        self.state = next;
        Some(next)
    }

    pub fn speed(&self) -> f64 {
        match self.state {
            SpinState::Spinning => self.base_speed,
            SpinState::Paused => 0.0,
        }
    }

    pub fn step(&self) -> RotationStep {
        RotationStep::from_speed(self.speed())
    }
}
