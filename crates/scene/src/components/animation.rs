//! Marker scale tweens.
//!
//! A marker's radial scale is a pure function of the time elapsed since the
//! marker was spawned: an optional grow-in followed by an endless yoyo.

use foundation::time::Time;

/// Scale used before a growing marker becomes visible.
pub const GROW_FROM: f64 = 0.0001;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Ease {
    Power2Out,
    SineInOut,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Power2Out => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::SineInOut => -((std::f64::consts::PI * t).cos() - 1.0) / 2.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GrowIn {
    pub delay: f64,
    pub duration: f64,
}

impl GrowIn {
    fn end(&self) -> f64 {
        self.delay + self.duration
    }
}

/// `1 → peak → 1 → …`, each leg lasting `leg_seconds`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Oscillation {
    pub peak: f64,
    pub leg_seconds: f64,
}

impl Oscillation {
    pub fn sample(&self, t: f64) -> f64 {
        if self.leg_seconds <= 0.0 || t <= 0.0 {
            return 1.0;
        }
        let legs = t / self.leg_seconds;
        let leg = legs.floor();
        let local = legs - leg;
        let rising = (leg as u64) % 2 == 0;
        let eased = Ease::SineInOut.apply(local);
        let k = if rising { eased } else { 1.0 - eased };
        1.0 + (self.peak - 1.0) * k
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerAnimation {
    pub started: Time,
    pub grow: Option<GrowIn>,
    pub oscillation: Oscillation,
}

impl MarkerAnimation {
    pub fn scale_z(&self, now: Time) -> f64 {
        let elapsed = now.since(self.started);
        match self.grow {
            Some(grow) if elapsed < grow.end() => {
                if elapsed <= grow.delay || grow.duration <= 0.0 {
                    return GROW_FROM;
                }
                let t = (elapsed - grow.delay) / grow.duration;
                GROW_FROM + (1.0 - GROW_FROM) * Ease::Power2Out.apply(t)
            }
            Some(grow) => self.oscillation.sample(elapsed - grow.end()),
            None => self.oscillation.sample(elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Ease, GROW_FROM, GrowIn, MarkerAnimation, Oscillation};
    use foundation::time::Time;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {a} ~= {b}");
    }

    fn main_marker(grow: bool) -> MarkerAnimation {
        MarkerAnimation {
            started: Time(10.0),
            grow: grow.then_some(GrowIn {
                delay: 0.09,
                duration: 0.55,
            }),
            oscillation: Oscillation {
                peak: 1.4,
                leg_seconds: 4.0,
            },
        }
    }

    #[test]
    fn eases_hit_endpoints() {
        for ease in [Ease::Power2Out, Ease::SineInOut] {
            assert_close(ease.apply(0.0), 0.0);
            assert_close(ease.apply(1.0), 1.0);
        }
        assert_close(Ease::SineInOut.apply(0.5), 0.5);
        assert!(Ease::Power2Out.apply(0.5) > 0.5);
    }

    #[test]
    fn grow_in_waits_for_delay_then_reaches_full_size() {
        let anim = main_marker(true);
        assert_eq!(anim.scale_z(Time(10.0)), GROW_FROM);
        assert_eq!(anim.scale_z(Time(10.05)), GROW_FROM);
        let mid = anim.scale_z(Time(10.09 + 0.275));
        assert!(mid > GROW_FROM && mid < 1.0);
        assert_close(anim.scale_z(Time(10.64)), 1.0);
    }

    #[test]
    fn oscillation_yoyos_between_one_and_peak() {
        let anim = main_marker(false);
        assert_close(anim.scale_z(Time(10.0)), 1.0);
        assert_close(anim.scale_z(Time(12.0)), 1.2);
        assert_close(anim.scale_z(Time(14.0)), 1.4);
        assert_close(anim.scale_z(Time(16.0)), 1.2);
        assert_close(anim.scale_z(Time(18.0)), 1.0);
    }

    #[test]
    fn time_before_spawn_counts_as_zero() {
        let anim = main_marker(false);
        assert_close(anim.scale_z(Time(3.0)), 1.0);
    }
}
