use foundation::math::{Rgb, Vec3};

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shape3D {
    Sphere { radius: f64 },
    /// Axis-aligned box in local space, centered on the origin.
    Box { size: Vec3 },
    /// Point cloud uploaded separately by the host (starfield).
    Points { count: u32 },
}

/// Texture assets the globe layers sample from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSlot {
    DayMap,
    BumpMap,
    NightMap,
    Clouds,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 4] = [
        TextureSlot::DayMap,
        TextureSlot::BumpMap,
        TextureSlot::NightMap,
        TextureSlot::Clouds,
    ];

    pub fn asset_path(self) -> &'static str {
        match self {
            TextureSlot::DayMap => "/textures/8k_globemap.jpeg",
            TextureSlot::BumpMap => "/textures/4k_earthbump.jpg",
            TextureSlot::NightMap => "/textures/4k_nightmap.jpg",
            TextureSlot::Clouds => "/textures/2k_earth_clouds.jpg",
        }
    }

    /// Flat color used until the texture has loaded.
    pub fn placeholder(self) -> [u8; 4] {
        match self {
            TextureSlot::DayMap => [26, 92, 160, 255],
            TextureSlot::BumpMap => [128, 128, 128, 255],
            TextureSlot::NightMap => [0, 0, 0, 255],
            TextureSlot::Clouds => [0, 0, 0, 0],
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Blend {
    #[default]
    Opaque,
    Alpha,
    Additive,
}

/// Which pass draws an entity. Order is draw order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    Stars,
    Surface,
    NightLights,
    Markers,
    Clouds,
    Glow,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub opacity: f32,
    pub blend: Blend,
    pub texture: Option<TextureSlot>,
}

impl Material {
    pub fn solid(color: Rgb) -> Self {
        Self {
            color,
            opacity: 1.0,
            blend: Blend::Opaque,
            texture: None,
        }
    }

    pub fn translucent(color: Rgb, opacity: f32) -> Self {
        Self {
            color,
            opacity,
            blend: Blend::Alpha,
            texture: None,
        }
    }

    pub fn textured(texture: TextureSlot, blend: Blend, opacity: f32) -> Self {
        Self {
            color: Rgb::WHITE,
            opacity,
            blend,
            texture: Some(texture),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Drawable3D {
    pub shape: Shape3D,
    pub material: Material,
    pub layer: RenderLayer,
}

impl Drawable3D {
    pub fn sphere(radius: f64, material: Material, layer: RenderLayer) -> Self {
        Self {
            shape: Shape3D::Sphere { radius },
            material,
            layer,
        }
    }

    pub fn marker_box(size: Vec3, material: Material) -> Self {
        Self {
            shape: Shape3D::Box { size },
            material,
            layer: RenderLayer::Markers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Blend, Drawable3D, Material, RenderLayer, Shape3D, TextureSlot};
    use foundation::math::{Rgb, Vec3};

    #[test]
    fn create_sphere_drawable() {
        let drawable = Drawable3D::sphere(
            1.0,
            Material::textured(TextureSlot::DayMap, Blend::Opaque, 1.0),
            RenderLayer::Surface,
        );
        assert!(matches!(drawable.shape, Shape3D::Sphere { .. }));
        assert_eq!(drawable.material.blend, Blend::Opaque);
    }

    #[test]
    fn cloud_and_marker_layers() {
        let clouds = Drawable3D::sphere(
            1.003,
            Material::textured(TextureSlot::Clouds, Blend::Additive, 0.3),
            RenderLayer::Clouds,
        );
        assert_eq!(clouds.material.texture, Some(TextureSlot::Clouds));

        let marker = Drawable3D::marker_box(
            Vec3::new(0.01, 0.01, 0.1),
            Material::translucent(Rgb::GREEN, 0.4),
        );
        assert_eq!(marker.layer, RenderLayer::Markers);
        assert_eq!(marker.material.blend, Blend::Alpha);
    }

    #[test]
    fn layers_draw_back_to_front() {
        assert!(RenderLayer::Stars < RenderLayer::Surface);
        assert!(RenderLayer::Markers < RenderLayer::Glow);
    }
}
