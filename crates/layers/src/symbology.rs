//! How an article looks as a marker.

use feed::Article;
use foundation::math::{Rgb, Vec3};
use foundation::time::Time;
use scene::components::{GrowIn, MarkerAnimation, Material, Oscillation};

pub const MARKER_RADIUS: f64 = 1.02;
pub const MARKER_WIDTH: f64 = 0.01;

pub const MAIN_OPACITY: f32 = 0.8;
pub const MAIN_DEFAULT_HEIGHT: f64 = 0.1;
pub const MAIN_MAX_HEIGHT: f64 = 0.6;

pub const SECONDARY_COLOR: Rgb = Rgb::from_hex(0x3CD2F9);
pub const SECONDARY_OPACITY: f32 = 0.4;
pub const SECONDARY_HEIGHT: f64 = 0.1;

/// Red for bad news through green for good news.
///
/// Negative sentiment is pushed further towards red.
pub fn sentiment_color(sentiment: f64) -> Rgb {
    let s = if sentiment.is_nan() { 0.0 } else { sentiment.clamp(-1.0, 1.0) };
    let exponent = if s < 0.0 { 1.5 } else { 1.0 };
    let t = ((s + 1.0) / 2.0).powf(exponent);
    Rgb::RED.lerp(Rgb::GREEN, t as f32)
}

/// Main marker height from the article's composite score.
pub fn main_marker_height(composite_score: f64) -> f64 {
    if composite_score > 0.0 {
        ((0.01 + composite_score / 1000.0).min(0.5) * 5.0).min(MAIN_MAX_HEIGHT)
    } else {
        MAIN_DEFAULT_HEIGHT
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerStyle {
    pub color: Rgb,
    pub opacity: f32,
    pub height: f64,
}

impl MarkerStyle {
    pub fn main(article: &Article) -> Self {
        Self {
            color: sentiment_color(article.sentiment),
            opacity: MAIN_OPACITY,
            height: main_marker_height(article.composite_score),
        }
    }

    pub fn secondary() -> Self {
        Self {
            color: SECONDARY_COLOR,
            opacity: SECONDARY_OPACITY,
            height: SECONDARY_HEIGHT,
        }
    }

    pub fn size(&self) -> Vec3 {
        Vec3::new(MARKER_WIDTH, MARKER_WIDTH, self.height)
    }

    pub fn material(&self) -> Material {
        Material::translucent(self.color, self.opacity)
    }
}

/// Timing of a marker kind's tweens.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerMotion {
    pub grow_seconds: f64,
    /// Delay step per social-score bucket.
    pub stagger: f64,
    pub stagger_buckets: f64,
    pub oscillation: Oscillation,
}

impl MarkerMotion {
    pub const MAIN: MarkerMotion = MarkerMotion {
        grow_seconds: 0.55,
        stagger: 0.03,
        stagger_buckets: 7.0,
        oscillation: Oscillation {
            peak: 1.4,
            leg_seconds: 4.0,
        },
    };

    pub const SECONDARY: MarkerMotion = MarkerMotion {
        grow_seconds: 0.45,
        stagger: 0.03,
        stagger_buckets: 5.0,
        oscillation: Oscillation {
            peak: 1.3,
            leg_seconds: 2.6,
        },
    };

    /// Deterministic per-article delay so markers don't pulse in sync.
    pub fn delay(&self, social_score: f64) -> f64 {
        let bucket = social_score % self.stagger_buckets;
        if bucket.is_finite() && bucket > 0.0 {
            bucket * self.stagger
        } else {
            0.0
        }
    }

    pub fn animation(&self, started: Time, social_score: f64, grow: bool) -> MarkerAnimation {
        MarkerAnimation {
            started,
            grow: grow.then(|| GrowIn {
                delay: self.delay(social_score),
                duration: self.grow_seconds,
            }),
            oscillation: self.oscillation,
        }
    }
}
