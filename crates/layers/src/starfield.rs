use foundation::math::{Rgb, Vec3};
use rand::Rng;

use crate::layer::{Layer, LayerId};

/// Stars around the live globe.
pub const DEFAULT_STAR_COUNT: u32 = 2000;
pub const STAR_MIN_RADIUS: f64 = 25.0;
pub const STAR_MAX_RADIUS: f64 = 50.0;
const STAR_HUE: f32 = 0.6;
const STAR_SATURATION: f32 = 0.2;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Star {
    pub position: Vec3,
    pub color: Rgb,
}

/// Uniform directions on a shell between the min and max radius, dim
/// bluish colors.
pub fn generate_starfield<R: Rng + ?Sized>(count: u32, rng: &mut R) -> Vec<Star> {
    (0..count)
        .map(|_| {
            let radius = rng.gen_range(STAR_MIN_RADIUS..STAR_MAX_RADIUS);
            let theta = std::f64::consts::TAU * rng.r#gen::<f64>();
            let phi = (2.0 * rng.r#gen::<f64>() - 1.0).clamp(-1.0, 1.0).acos();
            let position = Vec3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            );
            let brightness = rng.gen_range(0.1..0.6_f32);
            Star {
                position,
                color: Rgb::from_hsl(STAR_HUE, STAR_SATURATION, brightness),
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct StarfieldLayer {
    id: LayerId,
    stars: Vec<Star>,
}

impl StarfieldLayer {
    pub fn new<R: Rng + ?Sized>(id: u64, count: u32, rng: &mut R) -> Self {
        Self {
            id: LayerId(id),
            stars: generate_starfield(count, rng),
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

impl Layer for StarfieldLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn name(&self) -> &'static str {
        "stars"
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_STAR_COUNT, STAR_MAX_RADIUS, STAR_MIN_RADIUS, StarfieldLayer, generate_starfield};
    use crate::layer::Layer;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn stars_live_on_the_shell() {
        let mut rng = StdRng::seed_from_u64(42);
        let stars = generate_starfield(300, &mut rng);
        assert_eq!(stars.len(), 300);
        for star in &stars {
            let r = star.position.length();
            assert!(r >= STAR_MIN_RADIUS - 1e-9 && r <= STAR_MAX_RADIUS + 1e-9);
            assert!(star.color.b >= star.color.r);
            assert!(star.color.b < 0.75);
        }
    }

    #[test]
    fn same_seed_same_sky() {
        let a = StarfieldLayer::new(2, 10, &mut StdRng::seed_from_u64(1));
        let b = StarfieldLayer::new(2, 10, &mut StdRng::seed_from_u64(1));
        assert_eq!(a.stars(), b.stars());
        assert_eq!(a.name(), "stars");
    }

    #[test]
    fn default_sky_is_dense() {
        let layer = StarfieldLayer::new(2, DEFAULT_STAR_COUNT, &mut StdRng::seed_from_u64(5));
        assert_eq!(layer.len(), 2000);
    }
}
