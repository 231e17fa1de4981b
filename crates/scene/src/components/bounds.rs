use foundation::math::Vec3;

/// Local-space box a marker is hit-tested against.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ComponentBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl ComponentBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of `size` centered on the local origin, matching the unit box
    /// mesh scaled by `size`.
    pub fn centered(size: Vec3) -> Self {
        let half = size * 0.5;
        Self::new(-half, half)
    }
}

#[cfg(test)]
mod tests {
    use super::ComponentBounds;
    use foundation::math::Vec3;

    #[test]
    fn marker_box_is_centered_on_its_origin() {
        let b = ComponentBounds::centered(Vec3::new(0.01, 0.01, 0.2));
        assert_eq!(b.min, Vec3::new(-0.005, -0.005, -0.1));
        assert_eq!(b.max, Vec3::new(0.005, 0.005, 0.1));
    }
}
