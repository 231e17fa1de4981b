/// Linear RGB color with components in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);
    pub const GREEN: Rgb = Rgb::new(0.0, 1.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB` → color.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Hue, saturation and lightness all in `[0, 1]`.
    pub fn from_hsl(h: f32, s: f32, l: f32) -> Self {
        if s <= 0.0 {
            return Self::new(l, l, l);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |t: f32| {
            let t = t.rem_euclid(1.0);
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * 6.0 * (2.0 / 3.0 - t)
            } else {
                p
            }
        };
        Self::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
    }

    /// Linear interpolation; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Rgb;

    #[test]
    fn from_hex_splits_channels() {
        let c = Rgb::from_hex(0x3CD2F9);
        assert_eq!(c.r, 0x3C as f32 / 255.0);
        assert_eq!(c.g, 0xD2 as f32 / 255.0);
        assert_eq!(c.b, 0xF9 as f32 / 255.0);
    }

    #[test]
    fn hsl_primaries_and_greys() {
        let red = Rgb::from_hsl(0.0, 1.0, 0.5);
        assert!((red.r - 1.0).abs() < 1e-6 && red.g.abs() < 1e-6 && red.b.abs() < 1e-6);
        assert_eq!(Rgb::from_hsl(0.3, 0.0, 0.25), Rgb::new(0.25, 0.25, 0.25));

        let star = Rgb::from_hsl(0.6, 0.2, 0.4);
        assert!(star.b > star.r);
    }

    #[test]
    fn lerp_endpoints_and_clamp() {
        assert_eq!(Rgb::RED.lerp(Rgb::GREEN, 0.0), Rgb::RED);
        assert_eq!(Rgb::RED.lerp(Rgb::GREEN, 1.0), Rgb::GREEN);
        assert_eq!(Rgb::RED.lerp(Rgb::GREEN, 3.0), Rgb::GREEN);
        assert_eq!(Rgb::RED.lerp(Rgb::GREEN, 0.5), Rgb::new(0.5, 0.5, 0.0));
    }
}
