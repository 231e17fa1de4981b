use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;

use crate::World;
use crate::components::{ComponentBounds, MarkerInfo};
use crate::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
    /// Radius of the opaque globe centered on the world origin.
    pub occluder_radius: f64,
    /// Camera forward vector for the facing test. `None` uses the ray direction.
    pub view_dir: Option<Vec3>,
    pub require_facing: bool,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
            occluder_radius: 1.0,
            view_dir: None,
            require_facing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerHit {
    pub entity: EntityId,
    pub distance: f64,
    pub point: Vec3,
    pub info: MarkerInfo,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PickResult {
    pub marker: Option<MarkerHit>,
    /// Entry distance into the globe sphere, if the ray hits it.
    pub globe_distance: Option<f64>,
}

impl PickResult {
    /// Pointer rests on the globe surface or on a marker.
    pub fn over_globe(&self) -> bool {
        self.globe_distance.is_some() || self.marker.is_some()
    }
}

/// Ray-cast against every visible marker and the globe occluder.
///
/// Ordering contract:
/// - A marker counts only if its entry distance is not beyond the globe's
///   entry distance, and (with `require_facing`) its outward normal faces the
///   camera.
/// - Nearest eligible hit wins; equal distances go to the lower entity index.
pub fn pick_markers(world: &World, ray: Ray, opts: PickOptions) -> PickResult {
    let Some(dir) = ray.dir.try_normalize() else {
        return PickResult::default();
    };
    let ray = Ray::new(ray.origin, dir);
    let view_dir = opts
        .view_dir
        .and_then(|v| v.try_normalize())
        .unwrap_or(dir);

    let globe_distance = ray_sphere_entry(ray, opts.occluder_radius, opts.max_distance);
    let mut best: Option<(f64, EntityId, &MarkerInfo)> = None;

    for (entity, transform, info) in world.markers() {
        let Some(bounds) = world.bounds(entity) else {
            continue;
        };
        if transform.scale.x.abs() < 1e-12
            || transform.scale.y.abs() < 1e-12
            || transform.scale.z.abs() < 1e-12
        {
            continue;
        }

        if opts.require_facing {
            let normal = transform.position.normalize_or_zero();
            if view_dir.dot(normal) >= 0.0 {
                continue;
            }
        }

        // Into the marker's local frame: undo translation, rotation, scale.
        let inv = transform.rotation.conjugate();
        let to_local = |v: Vec3| {
            let r = inv.rotate(v);
            Vec3::new(
                r.x / transform.scale.x,
                r.y / transform.scale.y,
                r.z / transform.scale.z,
            )
        };
        let origin = to_local(ray.origin - transform.position);
        let local_dir = to_local(ray.dir);

        let Some(t) = ray_aabb_hit_t(
            origin.as_array(),
            local_dir.as_array(),
            bounds,
            0.0,
            opts.max_distance,
        ) else {
            continue;
        };

        if let Some(g) = globe_distance
            && t > g
        {
            continue;
        }

        best = match best {
            None => Some((t, entity, info)),
            Some((bt, be, bi)) => {
                let ord = stable_total_cmp_f64(t, bt).then_with(|| entity.index().cmp(&be.index()));
                if ord.is_lt() {
                    Some((t, entity, info))
                } else {
                    Some((bt, be, bi))
                }
            }
        };
    }

    let marker = best.map(|(t, entity, info)| MarkerHit {
        entity,
        distance: t,
        point: ray.at(t),
        info: info.clone(),
    });

    PickResult {
        marker,
        globe_distance,
    }
}

/// Entry distance of a normalized ray into a sphere at the origin.
pub fn ray_sphere_entry(ray: Ray, radius: f64, max_distance: f64) -> Option<f64> {
    let b = ray.origin.dot(ray.dir);
    let c = ray.origin.dot(ray.origin) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t0 = -b - sq;
    let t1 = -b + sq;
    let t = if t0 >= 0.0 { t0 } else { t1 };
    (t >= 0.0 && t <= max_distance).then_some(t)
}

fn ray_aabb_hit_t(
    origin: [f64; 3],
    dir: [f64; 3],
    bounds: ComponentBounds,
    mut t_min: f64,
    mut t_max: f64,
) -> Option<f64> {
    let min = bounds.min.as_array();
    let max = bounds.max.as_array();
    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];

        if d.abs() < 1e-12 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t1 = (min[axis] - o) * inv;
        let mut t2 = (max[axis] - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_max < t_min {
            return None;
        }
    }

    Some(t_min.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::{PickOptions, Ray, pick_markers, ray_sphere_entry};
    use crate::World;
    use crate::components::{
        ComponentBounds, MarkerInfo, MarkerKind, Transform, Visibility,
    };
    use crate::entity::EntityId;
    use foundation::math::{Quat, Vec3};

    fn spawn_marker(world: &mut World, position: Vec3, uri: &str) -> EntityId {
        let e = world.spawn();
        world.set_transform(
            e,
            Transform::translate(position)
                .with_rotation(Quat::from_unit_vectors(Vec3::Z, position.normalize_or_zero())),
        );
        world.set_bounds(e, ComponentBounds::centered(Vec3::new(0.01, 0.01, 0.1)));
        world.set_marker(
            e,
            MarkerInfo {
                uri: uri.into(),
                title: format!("title {uri}"),
                image: String::new(),
                url: Some(format!("https://example.org/{uri}")),
                kind: MarkerKind::Main,
            },
        );
        e
    }

    fn camera_ray() -> Ray {
        // Camera on +Z looking at the origin.
        Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn picks_front_marker() {
        let mut world = World::new();
        let front = spawn_marker(&mut world, Vec3::new(0.0, 0.0, 1.02), "front");

        let result = pick_markers(&world, camera_ray(), PickOptions::default());
        let hit = result.marker.as_ref().expect("hit");
        assert_eq!(hit.entity, front);
        assert_eq!(hit.info.uri, "front");
        assert!((hit.distance - (3.0 - 1.07)).abs() < 1e-9);
        assert!(result.over_globe());
    }

    #[test]
    fn markers_behind_globe_are_never_picked() {
        let mut world = World::new();
        spawn_marker(&mut world, Vec3::new(0.0, 0.0, -1.02), "back");

        let result = pick_markers(&world, camera_ray(), PickOptions::default());
        assert!(result.marker.is_none());
        assert!(result.globe_distance.is_some());

        // Even with the facing test off, the sphere occludes it.
        let opts = PickOptions {
            require_facing: false,
            ..PickOptions::default()
        };
        assert!(pick_markers(&world, camera_ray(), opts).marker.is_none());
    }

    #[test]
    fn facing_test_uses_view_direction() {
        let mut world = World::new();
        spawn_marker(&mut world, Vec3::new(0.0, 0.0, 1.02), "front");

        let opts = PickOptions {
            view_dir: Some(Vec3::new(0.0, 0.0, 1.0)),
            ..PickOptions::default()
        };
        assert!(pick_markers(&world, camera_ray(), opts).marker.is_none());
    }

    #[test]
    fn ray_missing_everything_is_not_over_globe() {
        let mut world = World::new();
        spawn_marker(&mut world, Vec3::new(0.0, 0.0, 1.02), "front");
        let ray = Ray::new(Vec3::new(5.0, 0.0, 3.0), Vec3::new(0.0, 0.0, -1.0));

        let result = pick_markers(&world, ray, PickOptions::default());
        assert!(!result.over_globe());
    }

    #[test]
    fn tie_breaks_by_entity_index() {
        let mut world = World::new();
        let first = spawn_marker(&mut world, Vec3::new(0.0, 0.0, 1.02), "a");
        spawn_marker(&mut world, Vec3::new(0.0, 0.0, 1.02), "b");

        let hit = pick_markers(&world, camera_ray(), PickOptions::default())
            .marker
            .expect("hit");
        assert_eq!(hit.entity, first);
    }

    #[test]
    fn hidden_and_flattened_markers_are_skipped() {
        let mut world = World::new();
        let hidden = spawn_marker(&mut world, Vec3::new(0.0, 0.0, 1.02), "hidden");
        world.set_visibility(hidden, Visibility::hidden());
        let flat = spawn_marker(&mut world, Vec3::new(0.0, 0.0, 1.02), "flat");
        if let Some(t) = world.transform_mut(flat) {
            t.scale.z = 0.0;
        }

        assert!(
            pick_markers(&world, camera_ray(), PickOptions::default())
                .marker
                .is_none()
        );
    }

    #[test]
    fn sphere_entry_from_outside_and_inside() {
        let t = ray_sphere_entry(camera_ray(), 1.0, 1e30).unwrap();
        assert!((t - 2.0).abs() < 1e-12);

        let inside = Ray::new(Vec3::ZERO, Vec3::X);
        assert!((ray_sphere_entry(inside, 1.0, 1e30).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(ray_sphere_entry(camera_ray(), 1.0, 1.0), None);
    }
}
