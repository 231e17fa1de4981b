use crate::components::{
    ComponentBounds, Drawable3D, MarkerAnimation, MarkerInfo, Transform, Visibility,
};
use crate::entity::EntityId;
use foundation::handles::Handle;
use foundation::time::Time;

/// Generational entity store with parent links.
///
/// Components live in parallel `Vec<Option<_>>` columns indexed by slot.
/// A despawned slot is cleared and pushed on the free list; its generation is
/// bumped so stale `EntityId`s stop resolving.
#[derive(Debug, Default)]
pub struct World {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    parents: Vec<Option<EntityId>>,
    children: Vec<Vec<EntityId>>,
    transforms: Vec<Option<Transform>>,
    bounds: Vec<Option<ComponentBounds>>,
    visibility: Vec<Option<Visibility>>,
    drawables_3d: Vec<Option<Drawable3D>>,
    markers: Vec<Option<MarkerInfo>>,
    animations: Vec<Option<MarkerAnimation>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        if let Some(index) = self.free.pop() {
            let idx = index as usize;
            self.alive[idx] = true;
            return EntityId(Handle::new(index, self.generations[idx]));
        }
        let index = self.generations.len() as u32;
        self.ensure_capacity(index as usize);
        self.alive[index as usize] = true;
        EntityId(Handle::new(index, 0))
    }

    pub fn spawn_child(&mut self, parent: EntityId) -> EntityId {
        let child = self.spawn();
        self.set_parent(child, parent);
        child
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        let idx = entity.index() as usize;
        self.alive.get(idx).copied().unwrap_or(false)
            && self.generations.get(idx).copied() == Some(entity.generation())
    }

    pub fn len(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove one entity. Its children are detached and become roots.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let idx = entity.index() as usize;

        if let Some(parent) = self.parents[idx].take() {
            let pidx = parent.index() as usize;
            self.children[pidx].retain(|c| *c != entity);
        }
        for child in std::mem::take(&mut self.children[idx]) {
            self.parents[child.index() as usize] = None;
        }

        self.transforms[idx] = None;
        self.bounds[idx] = None;
        self.visibility[idx] = None;
        self.drawables_3d[idx] = None;
        self.markers[idx] = None;
        self.animations[idx] = None;

        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free.push(entity.index());
        true
    }

    /// Remove an entity and everything below it. Returns how many were removed.
    pub fn despawn_recursive(&mut self, entity: EntityId) -> usize {
        if !self.is_alive(entity) {
            return 0;
        }
        let mut stack = vec![entity];
        let mut order = Vec::new();
        while let Some(e) = stack.pop() {
            order.push(e);
            stack.extend(self.children[e.index() as usize].iter().copied());
        }
        let mut removed = 0;
        for e in order.into_iter().rev() {
            if self.despawn(e) {
                removed += 1;
            }
        }
        removed
    }

    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) {
        if !self.is_alive(child) || !self.is_alive(parent) || child == parent {
            return;
        }
        let cidx = child.index() as usize;
        if let Some(old) = self.parents[cidx].take() {
            self.children[old.index() as usize].retain(|c| *c != child);
        }
        self.parents[cidx] = Some(parent);
        self.children[parent.index() as usize].push(child);
    }

    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        if !self.is_alive(entity) {
            return None;
        }
        self.parents[entity.index() as usize]
    }

    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        if !self.is_alive(entity) {
            return &[];
        }
        &self.children[entity.index() as usize]
    }

    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        if self.is_alive(entity) {
            self.transforms[entity.index() as usize] = Some(transform);
        }
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        if !self.is_alive(entity) {
            return None;
        }
        self.transforms[entity.index() as usize]
    }

    pub fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        if !self.is_alive(entity) {
            return None;
        }
        self.transforms[entity.index() as usize].as_mut()
    }

    /// Local transform composed through every ancestor.
    pub fn world_transform(&self, entity: EntityId) -> Option<Transform> {
        let mut out = self.transform(entity)?;
        let mut cursor = self.parent(entity);
        while let Some(parent) = cursor {
            let local = self.transform(parent).unwrap_or_default();
            out = Transform::compose(&local, &out);
            cursor = self.parent(parent);
        }
        Some(out)
    }

    pub fn set_bounds(&mut self, entity: EntityId, bounds: ComponentBounds) {
        if self.is_alive(entity) {
            self.bounds[entity.index() as usize] = Some(bounds);
        }
    }

    pub fn bounds(&self, entity: EntityId) -> Option<ComponentBounds> {
        if !self.is_alive(entity) {
            return None;
        }
        self.bounds[entity.index() as usize]
    }

    pub fn set_visibility(&mut self, entity: EntityId, visibility: Visibility) {
        if self.is_alive(entity) {
            self.visibility[entity.index() as usize] = Some(visibility);
        }
    }

    /// Hidden if the entity or any ancestor is hidden.
    pub fn is_visible(&self, entity: EntityId) -> bool {
        let mut cursor = Some(entity);
        while let Some(e) = cursor {
            if !self.is_alive(e) {
                return false;
            }
            let visible = self.visibility[e.index() as usize]
                .map(|v| v.visible)
                .unwrap_or(true);
            if !visible {
                return false;
            }
            cursor = self.parent(e);
        }
        true
    }

    pub fn set_drawable_3d(&mut self, entity: EntityId, drawable: Drawable3D) {
        if self.is_alive(entity) {
            self.drawables_3d[entity.index() as usize] = Some(drawable);
        }
    }

    pub fn set_marker(&mut self, entity: EntityId, info: MarkerInfo) {
        if self.is_alive(entity) {
            self.markers[entity.index() as usize] = Some(info);
        }
    }

    pub fn marker(&self, entity: EntityId) -> Option<&MarkerInfo> {
        if !self.is_alive(entity) {
            return None;
        }
        self.markers[entity.index() as usize].as_ref()
    }

    pub fn set_animation(&mut self, entity: EntityId, animation: MarkerAnimation) {
        if self.is_alive(entity) {
            self.animations[entity.index() as usize] = Some(animation);
        }
    }

    pub fn animation(&self, entity: EntityId) -> Option<MarkerAnimation> {
        if !self.is_alive(entity) {
            return None;
        }
        self.animations[entity.index() as usize]
    }

    /// Write every animated entity's radial scale for time `now`.
    pub fn advance_animations(&mut self, now: Time) -> usize {
        let mut touched = 0;
        for (idx, anim) in self.animations.iter().enumerate() {
            let Some(anim) = anim else { continue };
            let Some(transform) = self.transforms[idx].as_mut() else {
                continue;
            };
            transform.scale.z = anim.scale_z(now);
            touched += 1;
        }
        touched
    }

    /// Visible drawables with their world transforms, in slot order.
    pub fn drawables_3d(&self) -> Vec<(EntityId, Transform, Drawable3D)> {
        let mut out = Vec::new();
        for (idx, drawable) in self.drawables_3d.iter().enumerate() {
            let Some(drawable) = drawable else { continue };
            let entity = self.entity_at(idx);
            if !self.is_visible(entity) {
                continue;
            }
            let Some(transform) = self.world_transform(entity) else {
                continue;
            };
            out.push((entity, transform, *drawable));
        }
        out
    }

    /// Visible markers with their world transforms, in slot order.
    pub fn markers(&self) -> Vec<(EntityId, Transform, &MarkerInfo)> {
        let mut out = Vec::new();
        for (idx, info) in self.markers.iter().enumerate() {
            let Some(info) = info else { continue };
            let entity = self.entity_at(idx);
            if !self.is_visible(entity) {
                continue;
            }
            let Some(transform) = self.world_transform(entity) else {
                continue;
            };
            out.push((entity, transform, info));
        }
        out
    }

    fn entity_at(&self, idx: usize) -> EntityId {
        EntityId(Handle::new(idx as u32, self.generations[idx]))
    }

    fn ensure_capacity(&mut self, idx: usize) {
        if self.generations.len() <= idx {
            let new_len = idx + 1;
            self.generations.resize(new_len, 0);
            self.alive.resize(new_len, false);
            self.parents.resize(new_len, None);
            self.children.resize_with(new_len, Vec::new);
            self.transforms.resize(new_len, None);
            self.bounds.resize(new_len, None);
            self.visibility.resize(new_len, None);
            self.drawables_3d.resize(new_len, None);
            self.markers.resize(new_len, None);
            self.animations.resize(new_len, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::World;
    use crate::components::{
        Drawable3D, GrowIn, MarkerAnimation, MarkerInfo, MarkerKind, Material, Oscillation,
        RenderLayer, Transform, Visibility,
    };
    use foundation::math::{Quat, Rgb, Vec3};
    use foundation::time::Time;

    fn info(uri: &str) -> MarkerInfo {
        MarkerInfo {
            uri: uri.into(),
            title: String::new(),
            image: String::new(),
            url: None,
            kind: MarkerKind::Main,
        }
    }

    #[test]
    fn spawn_and_collect_drawables() {
        let mut world = World::new();
        let entity = world.spawn();
        world.set_transform(entity, Transform::identity());
        world.set_drawable_3d(
            entity,
            Drawable3D::sphere(1.0, Material::solid(Rgb::WHITE), RenderLayer::Surface),
        );

        let drawables = world.drawables_3d();
        assert_eq!(drawables.len(), 1);
        assert_eq!(drawables[0].0, entity);
    }

    #[test]
    fn hidden_parent_hides_children() {
        let mut world = World::new();
        let group = world.spawn();
        world.set_transform(group, Transform::identity());
        let child = world.spawn_child(group);
        world.set_transform(child, Transform::identity());
        world.set_marker(child, info("a"));
        assert_eq!(world.markers().len(), 1);

        world.set_visibility(group, Visibility::hidden());
        assert!(world.markers().is_empty());
    }

    #[test]
    fn stale_handles_do_not_resolve_after_reuse() {
        let mut world = World::new();
        let a = world.spawn();
        world.set_transform(a, Transform::identity());
        assert!(world.despawn(a));
        assert!(!world.despawn(a));

        let b = world.spawn();
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(world.transform(a).is_none());
        assert!(world.transform(b).is_none());
        world.set_transform(a, Transform::identity());
        assert!(world.transform(b).is_none());
    }

    #[test]
    fn world_transform_composes_parent_rotation() {
        let mut world = World::new();
        let group = world.spawn();
        world.set_transform(
            group,
            Transform::identity().with_rotation(Quat::from_rotation_y(std::f64::consts::PI)),
        );
        let child = world.spawn_child(group);
        world.set_transform(child, Transform::translate(Vec3::new(1.0, 0.0, 0.0)));

        let t = world.world_transform(child).unwrap();
        assert!((t.position - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn despawn_recursive_removes_subtree() {
        let mut world = World::new();
        let group = world.spawn();
        let a = world.spawn_child(group);
        let b = world.spawn_child(a);
        let other = world.spawn();

        assert_eq!(world.despawn_recursive(a), 2);
        assert!(!world.is_alive(a));
        assert!(!world.is_alive(b));
        assert!(world.children(group).is_empty());
        assert!(world.is_alive(other));
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn advance_animations_writes_scale_z() {
        let mut world = World::new();
        let e = world.spawn();
        world.set_transform(e, Transform::identity());
        world.set_animation(
            e,
            MarkerAnimation {
                started: Time(0.0),
                grow: Some(GrowIn {
                    delay: 0.0,
                    duration: 1.0,
                }),
                oscillation: Oscillation {
                    peak: 1.3,
                    leg_seconds: 2.6,
                },
            },
        );

        assert_eq!(world.advance_animations(Time(0.0)), 1);
        assert!(world.transform(e).unwrap().scale.z < 0.001);
        world.advance_animations(Time(1.0 + 2.6));
        assert!((world.transform(e).unwrap().scale.z - 1.3).abs() < 1e-9);
        assert_eq!(world.transform(e).unwrap().scale.x, 1.0);
    }
}
