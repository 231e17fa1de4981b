use foundation::math::{Quat, Rgb, Vec3};
use foundation::time::Time;
use runtime::spin::Rotations;

use crate::World;
use crate::components::{
    Blend, ComponentBounds, Drawable3D, MarkerAnimation, MarkerInfo, Material, RenderLayer,
    Shape3D, TextureSlot, Transform,
};
use crate::entity::EntityId;

/// Axial tilt of the globe group about +Z (degrees).
pub const AXIAL_TILT_DEG: f64 = -12.4;
pub const GLOBE_RADIUS: f64 = 1.0;
pub const CLOUD_SCALE: f64 = 1.003;
pub const GLOW_SCALE: f64 = 1.01;
pub const NIGHT_LIGHTS_OPACITY: f32 = 0.6;
pub const CLOUD_OPACITY: f32 = 0.35;
pub const GLOW_COLOR: Rgb = Rgb::from_hex(0x4DA6FF);
pub const GLOW_OPACITY: f32 = 0.15;

/// One marker ready to be attached to the globe group.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpawn {
    /// Center of the box in globe-group space.
    pub position: Vec3,
    /// Box extent; `z` is the radial axis.
    pub size: Vec3,
    pub material: Material,
    pub info: MarkerInfo,
    pub animation: MarkerAnimation,
}

/// Entity layout of the globe:
///
/// ```text
/// group (tilt + spin)
/// ├── surface        (day map, bump map)
/// ├── night lights   (additive)
/// ├── clouds         (own spin, additive)
/// ├── glow           (alpha shell)
/// └── markers…
/// stars              (root, counter-spin)
/// ```
#[derive(Debug, Clone)]
pub struct GlobeScene {
    pub group: EntityId,
    pub surface: EntityId,
    pub night_lights: EntityId,
    pub clouds: EntityId,
    pub glow: EntityId,
    pub stars: EntityId,
    markers: Vec<EntityId>,
}

impl GlobeScene {
    pub fn spawn(world: &mut World, star_count: u32) -> Self {
        let group = world.spawn();
        world.set_transform(group, Transform::identity().with_rotation(tilt()));

        let surface = spawn_shell(
            world,
            group,
            1.0,
            Drawable3D::sphere(
                GLOBE_RADIUS,
                Material::textured(TextureSlot::DayMap, Blend::Opaque, 1.0),
                RenderLayer::Surface,
            ),
        );
        world.set_bounds(
            surface,
            ComponentBounds::centered(Vec3::splat(GLOBE_RADIUS * 2.0)),
        );

        let night_lights = spawn_shell(
            world,
            group,
            1.0,
            Drawable3D::sphere(
                GLOBE_RADIUS,
                Material::textured(TextureSlot::NightMap, Blend::Additive, NIGHT_LIGHTS_OPACITY),
                RenderLayer::NightLights,
            ),
        );
        let clouds = spawn_shell(
            world,
            group,
            CLOUD_SCALE,
            Drawable3D::sphere(
                GLOBE_RADIUS,
                Material::textured(TextureSlot::Clouds, Blend::Additive, CLOUD_OPACITY),
                RenderLayer::Clouds,
            ),
        );
        let glow = spawn_shell(
            world,
            group,
            GLOW_SCALE,
            Drawable3D::sphere(
                GLOBE_RADIUS,
                Material::translucent(GLOW_COLOR, GLOW_OPACITY),
                RenderLayer::Glow,
            ),
        );

        let stars = world.spawn();
        world.set_transform(stars, Transform::identity());
        world.set_drawable_3d(
            stars,
            Drawable3D {
                shape: Shape3D::Points { count: star_count },
                material: Material::translucent(Rgb::WHITE, 1.0),
                layer: RenderLayer::Stars,
            },
        );

        tracing::debug!(star_count, "globe scene spawned");
        Self {
            group,
            surface,
            night_lights,
            clouds,
            glow,
            stars,
            markers: Vec::new(),
        }
    }

    pub fn markers(&self) -> &[EntityId] {
        &self.markers
    }

    /// Set every rotating part from accumulated yaw angles.
    pub fn apply_rotations(&self, world: &mut World, rotations: &Rotations) {
        if let Some(t) = world.transform_mut(self.group) {
            t.rotation = tilt().mul(Quat::from_rotation_y(rotations.globe_y));
        }
        if let Some(t) = world.transform_mut(self.clouds) {
            t.rotation = Quat::from_rotation_y(rotations.clouds_y);
        }
        if let Some(t) = world.transform_mut(self.stars) {
            t.rotation = Quat::from_rotation_y(rotations.stars_y);
        }
    }

    /// Attach a marker box to the globe group, long axis along the radius.
    pub fn spawn_marker(&mut self, world: &mut World, spawn: MarkerSpawn, now: Time) -> EntityId {
        let normal = spawn.position.normalize_or_zero();
        let rotation = Quat::from_unit_vectors(Vec3::Z, normal);
        let scale_z = spawn.animation.scale_z(now);

        let entity = world.spawn_child(self.group);
        world.set_transform(
            entity,
            Transform::translate(spawn.position)
                .with_rotation(rotation)
                .with_scale(Vec3::new(1.0, 1.0, scale_z)),
        );
        world.set_drawable_3d(entity, Drawable3D::marker_box(spawn.size, spawn.material));
        world.set_bounds(entity, ComponentBounds::centered(spawn.size));
        world.set_marker(entity, spawn.info);
        world.set_animation(entity, spawn.animation);
        self.markers.push(entity);
        entity
    }

    /// Despawn every marker. Returns how many were removed.
    pub fn clear_markers(&mut self, world: &mut World) -> usize {
        let removed: usize = self
            .markers
            .drain(..)
            .map(|m| world.despawn_recursive(m))
            .sum();
        tracing::trace!(removed, "markers cleared");
        removed
    }

    /// Tear down the whole globe, markers included.
    pub fn despawn(mut self, world: &mut World) {
        self.clear_markers(world);
        world.despawn_recursive(self.group);
        world.despawn_recursive(self.stars);
    }
}

fn tilt() -> Quat {
    Quat::from_rotation_z(AXIAL_TILT_DEG.to_radians())
}

fn spawn_shell(world: &mut World, group: EntityId, scale: f64, drawable: Drawable3D) -> EntityId {
    let entity = world.spawn_child(group);
    world.set_transform(entity, Transform::identity().with_uniform_scale(scale));
    world.set_drawable_3d(entity, drawable);
    entity
}

#[cfg(test)]
mod tests {
    use super::{AXIAL_TILT_DEG, GlobeScene, MarkerSpawn};
    use crate::World;
    use crate::components::{
        MarkerAnimation, MarkerInfo, MarkerKind, Material, Oscillation, RenderLayer,
    };
    use foundation::math::{Rgb, Vec3};
    use foundation::time::Time;
    use runtime::spin::Rotations;

    fn spawn_at(position: Vec3, uri: &str) -> MarkerSpawn {
        MarkerSpawn {
            position,
            size: Vec3::new(0.01, 0.01, 0.1),
            material: Material::translucent(Rgb::GREEN, 0.8),
            info: MarkerInfo {
                uri: uri.into(),
                title: String::new(),
                image: String::new(),
                url: None,
                kind: MarkerKind::Main,
            },
            animation: MarkerAnimation {
                started: Time::ZERO,
                grow: None,
                oscillation: Oscillation {
                    peak: 1.4,
                    leg_seconds: 4.0,
                },
            },
        }
    }

    #[test]
    fn spawns_all_layers() {
        let mut world = World::new();
        let globe = GlobeScene::spawn(&mut world, 500);

        let layers: Vec<RenderLayer> = world.drawables_3d().iter().map(|d| d.2.layer).collect();
        for layer in [
            RenderLayer::Surface,
            RenderLayer::NightLights,
            RenderLayer::Clouds,
            RenderLayer::Glow,
            RenderLayer::Stars,
        ] {
            assert!(layers.contains(&layer), "missing {layer:?}");
        }
        assert_eq!(world.parent(globe.clouds), Some(globe.group));
        assert_eq!(world.parent(globe.stars), None);
    }

    #[test]
    fn group_is_tilted() {
        let mut world = World::new();
        let globe = GlobeScene::spawn(&mut world, 0);
        let up = world
            .world_transform(globe.group)
            .unwrap()
            .transform_vector(Vec3::Y);
        let expected = AXIAL_TILT_DEG.to_radians();
        assert!((up.x - (-expected.sin())).abs() < 1e-12);
        assert!((up.y - expected.cos()).abs() < 1e-12);
    }

    #[test]
    fn marker_long_axis_points_at_center() {
        let mut world = World::new();
        let mut globe = GlobeScene::spawn(&mut world, 0);
        let m = globe.spawn_marker(&mut world, spawn_at(Vec3::new(0.0, 1.02, 0.0), "a"), Time::ZERO);

        let local = world.transform(m).unwrap();
        let axis = local.rotation.rotate(Vec3::Z);
        assert!((axis - Vec3::Y).length() < 1e-9);
    }

    #[test]
    fn clear_markers_leaves_layers() {
        let mut world = World::new();
        let mut globe = GlobeScene::spawn(&mut world, 0);
        globe.spawn_marker(&mut world, spawn_at(Vec3::new(1.02, 0.0, 0.0), "a"), Time::ZERO);
        globe.spawn_marker(&mut world, spawn_at(Vec3::new(0.0, 0.0, 1.02), "b"), Time::ZERO);
        assert_eq!(world.markers().len(), 2);

        assert_eq!(globe.clear_markers(&mut world), 2);
        assert!(world.markers().is_empty());
        assert!(globe.markers().is_empty());
        assert_eq!(world.drawables_3d().len(), 5);
    }

    #[test]
    fn rotations_spin_markers_with_group() {
        let mut world = World::new();
        let mut globe = GlobeScene::spawn(&mut world, 0);
        let m = globe.spawn_marker(&mut world, spawn_at(Vec3::new(1.02, 0.0, 0.0), "a"), Time::ZERO);
        let before = world.world_transform(m).unwrap().position;

        globe.apply_rotations(
            &mut world,
            &Rotations {
                globe_y: 0.5,
                clouds_y: 0.0,
                stars_y: 0.0,
            },
        );
        let after = world.world_transform(m).unwrap().position;
        assert!((before - after).length() > 0.1);
        assert!((after.length() - 1.02).abs() < 1e-9);
    }
}
