//! Everything the globe does per frame, independent of the browser.
//!
//! The wasm layer forwards DOM events here and draws the returned
//! [`RenderFrame`]; tests drive the same code natively.

use feed::Article;
use foundation::math::Vec2;
use foundation::time::Time;
use gpu::camera::{PerspectiveCamera, ndc_from_pointer};
use gpu::mesh::StarVertex;
use gpu::renderer::{RenderFrame, Renderer};
use layers::markers::{Jitter, MarkerLayer, RebuildStats};
use layers::starfield::{Star, StarfieldLayer};
use rand::Rng;
use runtime::event_bus::{Event, EventBus, GlobeEvent};
use runtime::frame::Frame;
use runtime::spin::{Rotations, Spin, SpinState};
use scene::World;
use scene::components::MarkerInfo;
use scene::picking::{PickOptions, PickResult, pick_markers};
use scene::prefabs::GlobeScene;

use crate::globe_controller::GlobeController;
use crate::pointer::{PointerGesture, PointerState};

const MARKER_LAYER_ID: u64 = 1;
const STAR_LAYER_ID: u64 = 2;

/// What the tooltip shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Hover {
    pub info: MarkerInfo,
    /// Canvas-relative tooltip anchor.
    pub tooltip: Vec2,
}

pub struct FrameOutput {
    pub render: RenderFrame,
    pub camera: PerspectiveCamera,
}

pub struct GlobeView {
    world: World,
    globe: GlobeScene,
    markers: MarkerLayer,
    stars: StarfieldLayer,
    jitter: Box<dyn Jitter>,
    spin: Spin,
    rotations: Rotations,
    controller: GlobeController,
    pointer: PointerState,
    gesture: PointerGesture,
    last_pick: PickResult,
    hover: Option<Hover>,
    frame: Option<Frame>,
    events: EventBus,
    articles_revision: Option<u64>,
}

impl GlobeView {
    pub fn new<R: Rng + ?Sized>(
        width_px: f64,
        height_px: f64,
        star_count: u32,
        rng: &mut R,
        jitter: Box<dyn Jitter>,
    ) -> Self {
        let mut world = World::new();
        let globe = GlobeScene::spawn(&mut world, star_count);
        Self {
            world,
            globe,
            markers: MarkerLayer::new(MARKER_LAYER_ID),
            stars: StarfieldLayer::new(STAR_LAYER_ID, star_count, rng),
            jitter,
            spin: Spin::default(),
            rotations: Rotations::default(),
            controller: GlobeController::new(width_px, height_px),
            pointer: PointerState::default(),
            gesture: PointerGesture::default(),
            last_pick: PickResult::default(),
            hover: None,
            frame: None,
            events: EventBus::new(),
            articles_revision: None,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn stars(&self) -> &[Star] {
        self.stars.stars()
    }

    pub fn star_vertices(&self) -> Vec<StarVertex> {
        self.stars
            .stars()
            .iter()
            .map(|s| StarVertex {
                position: s.position.to_f32(),
                color: [s.color.r, s.color.g, s.color.b],
            })
            .collect()
    }

    pub fn spin_state(&self) -> SpinState {
        self.spin.state()
    }

    pub fn hover(&self) -> Option<&Hover> {
        self.hover.as_ref()
    }

    pub fn camera(&self) -> PerspectiveCamera {
        self.controller.camera()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    fn current_frame(&self) -> Frame {
        self.frame.unwrap_or(Frame::first(Time::ZERO))
    }

    /// Rebuild markers when the visible article list changed.
    pub fn sync_articles(
        &mut self,
        articles: &[Article],
        revision: u64,
        now: Time,
    ) -> Option<RebuildStats> {
        if self.articles_revision == Some(revision) {
            return None;
        }
        self.articles_revision = Some(revision);
        let stats = self.markers.rebuild(
            &mut self.world,
            &mut self.globe,
            articles,
            now,
            self.jitter.as_mut(),
        );
        // Old hit targets are gone.
        self.last_pick = PickResult::default();
        self.set_hover(None);
        self.events.emit(
            self.current_frame(),
            GlobeEvent::MarkersRebuilt {
                count: stats.spawned,
            },
        );
        Some(stats)
    }

    pub fn resize(&mut self, width_px: f64, height_px: f64) {
        self.controller.set_viewport(width_px, height_px);
    }

    fn place_pointer(&mut self, client: Vec2, origin: Vec2, size: Vec2) {
        self.pointer = PointerState {
            client,
            origin,
            size,
            inside: true,
        };
    }

    /// `origin`/`size` are the canvas bounding box at event time.
    pub fn pointer_move(&mut self, client: Vec2, origin: Vec2, size: Vec2, now_s: f64) {
        self.place_pointer(client, origin, size);
        self.gesture.moved(client);
        self.controller.on_pointer_move(self.pointer.local(), now_s);
    }

    /// Touch presses arrive without a preceding move, so the press carries
    /// its own position.
    pub fn pointer_down(
        &mut self,
        client: Vec2,
        origin: Vec2,
        size: Vec2,
        button: i16,
        now_s: f64,
    ) {
        self.place_pointer(client, origin, size);
        self.gesture.down(client);
        self.controller
            .on_pointer_down(self.pointer.local(), button, now_s);
    }

    /// Returns the url to open when the release completes a click on a
    /// marker that has one.
    pub fn pointer_up(&mut self) -> Option<String> {
        self.controller.on_pointer_up();
        if !self.gesture.up() {
            return None;
        }
        let hit = self.pick()?.marker?;
        let url = hit.info.link()?.to_string();
        tracing::debug!(uri = %hit.info.uri, %url, "marker clicked");
        self.events
            .emit(self.current_frame(), GlobeEvent::OpenUrl { url: url.clone() });
        Some(url)
    }

    pub fn pointer_leave(&mut self) {
        self.pointer.inside = false;
        self.gesture = PointerGesture::default();
        self.controller.on_pointer_up();
        self.last_pick = PickResult::default();
        self.set_hover(None);
    }

    /// `true` when the wheel zoomed the globe and the page must not scroll.
    pub fn wheel(&mut self, delta_y: f64) -> bool {
        self.controller.on_wheel(delta_y)
    }

    pub fn frame(&mut self, now: Time) -> FrameOutput {
        let frame = match self.frame {
            Some(prev) => prev.next(now),
            None => Frame::first(now),
        };
        let dt = self.frame.map(|prev| frame.dt_since(prev)).unwrap_or(0.0);
        self.frame = Some(frame);

        let over = self.last_pick.over_globe();
        self.controller.set_pointer_over_globe(over);
        match self.spin.update(over) {
            Some(SpinState::Paused) => self.events.emit(frame, GlobeEvent::SpinPaused),
            Some(SpinState::Spinning) => self.events.emit(frame, GlobeEvent::SpinResumed),
            None => {}
        }

        self.rotations.apply(self.spin.step());
        self.globe.apply_rotations(&mut self.world, &self.rotations);
        self.world.advance_animations(frame.time);
        self.controller.update(dt);

        self.last_pick = self.pick().unwrap_or_default();
        self.controller
            .set_pointer_over_globe(self.last_pick.over_globe());
        let hover = self.last_pick.marker.as_ref().map(|hit| Hover {
            info: hit.info.clone(),
            tooltip: self.pointer.tooltip_position(),
        });
        self.set_hover(hover);

        FrameOutput {
            render: Renderer::collect(&self.world),
            camera: self.controller.camera(),
        }
    }

    fn pick(&self) -> Option<PickResult> {
        if !self.pointer.inside {
            return None;
        }
        let ndc = ndc_from_pointer(self.pointer.client, self.pointer.origin, self.pointer.size)?;
        let camera = self.controller.camera();
        let ray = camera.ray_from_ndc(ndc)?;
        Some(pick_markers(
            &self.world,
            ray,
            PickOptions {
                view_dir: Some(camera.forward()),
                ..PickOptions::default()
            },
        ))
    }

    fn set_hover(&mut self, hover: Option<Hover>) {
        let before = self.hover.as_ref().map(|h| h.info.uri.as_str());
        let after = hover.as_ref().map(|h| h.info.uri.as_str());
        if before != after {
            let uri = after.map(str::to_string);
            self.events
                .emit(self.current_frame(), GlobeEvent::HoverChanged { uri });
        }
        self.hover = hover;
    }

    /// Release every entity the globe owns.
    pub fn teardown(mut self) {
        let removed = self.globe.clear_markers(&mut self.world);
        self.globe.despawn(&mut self.world);
        tracing::debug!(markers = removed, remaining = self.world.len(), "globe torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::GlobeView;
    use feed::{Article, LatLngLabel};
    use foundation::math::Vec2;
    use foundation::time::Time;
    use layers::markers::FixedJitter;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use runtime::event_bus::GlobeEvent;
    use runtime::spin::SpinState;

    const ORIGIN: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    const SIZE: Vec2 = Vec2 { x: 1280.0, y: 720.0 };
    const CENTER: Vec2 = Vec2 { x: 640.0, y: 360.0 };
    const CORNER: Vec2 = Vec2 { x: 5.0, y: 5.0 };

    fn view() -> GlobeView {
        let mut rng = StdRng::seed_from_u64(3);
        GlobeView::new(1280.0, 720.0, 50, &mut rng, Box::new(FixedJitter(0.0)))
    }

    /// lat 0, lon -90 sits on +Z, straight in front of the default camera.
    fn facing_article(uri: &str) -> Article {
        let mut a = feed::format::format_article(feed::format::RawArticle {
            uri: Some(uri.into()),
            ..Default::default()
        });
        a.main_location = Some(LatLngLabel {
            label: "front".into(),
            latitude: 0.0,
            longitude: -90.0,
        });
        a.url = Some(format!("https://news.example/{uri}"));
        a
    }

    fn far_side_article(uri: &str) -> Article {
        let mut a = facing_article(uri);
        a.main_location = Some(LatLngLabel {
            label: "back".into(),
            latitude: 0.0,
            longitude: 90.0,
        });
        a
    }

    #[test]
    fn hovering_a_facing_marker_pauses_spin() {
        let mut v = view();
        v.sync_articles(&[facing_article("a")], 1, Time::ZERO);
        v.frame(Time(1.0));
        assert_eq!(v.spin_state(), SpinState::Spinning);

        v.pointer_move(CENTER, ORIGIN, SIZE, 1.0);
        v.frame(Time(1.1));
        let hover = v.hover().expect("marker under the pointer");
        assert_eq!(hover.info.uri, "a");
        assert_eq!(hover.tooltip, Vec2::new(690.0, 310.0));

        v.frame(Time(1.2));
        assert_eq!(v.spin_state(), SpinState::Paused);

        v.pointer_move(CORNER, ORIGIN, SIZE, 1.3);
        v.frame(Time(1.3));
        assert!(v.hover().is_none());
        v.frame(Time(1.4));
        assert_eq!(v.spin_state(), SpinState::Spinning);

        let kinds: Vec<&str> = v.drain_events().iter().map(|e| e.event.kind()).collect();
        assert!(kinds.contains(&"spin_paused"));
        assert!(kinds.contains(&"spin_resumed"));
    }

    #[test]
    fn markers_behind_the_globe_are_never_picked() {
        let mut v = view();
        v.sync_articles(&[far_side_article("b")], 1, Time::ZERO);
        v.pointer_move(CENTER, ORIGIN, SIZE, 1.0);
        v.frame(Time(1.0));
        assert!(v.hover().is_none());
        // Still over the globe surface.
        v.frame(Time(1.1));
        assert_eq!(v.spin_state(), SpinState::Paused);
    }

    #[test]
    fn click_opens_url_but_drag_does_not() {
        let mut v = view();
        v.sync_articles(&[facing_article("a")], 1, Time::ZERO);
        v.pointer_move(CENTER, ORIGIN, SIZE, 1.0);
        v.frame(Time(1.0));

        v.pointer_down(CENTER, ORIGIN, SIZE, 0, 1.0);
        assert_eq!(v.pointer_up().as_deref(), Some("https://news.example/a"));

        v.pointer_down(CENTER, ORIGIN, SIZE, 0, 1.1);
        v.pointer_move(Vec2::new(641.0, 360.0), ORIGIN, SIZE, 1.2);
        assert_eq!(v.pointer_up(), None);

        let opened = v
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e.event, GlobeEvent::OpenUrl { .. }))
            .count();
        assert_eq!(opened, 1);
    }

    #[test]
    fn tap_without_hover_opens_the_marker_under_it() {
        let mut v = view();
        v.sync_articles(&[facing_article("a")], 1, Time::ZERO);
        v.frame(Time(1.0));
        // A finger lifted elsewhere leaves the pointer outside the canvas.
        v.pointer_leave();

        v.pointer_down(CENTER, ORIGIN, SIZE, 0, 1.1);
        v.pointer_move(CENTER, ORIGIN, SIZE, 1.1);
        assert_eq!(v.pointer_up().as_deref(), Some("https://news.example/a"));
    }

    #[test]
    fn replacing_articles_drops_stale_markers() {
        let mut v = view();
        v.sync_articles(&[facing_article("a"), far_side_article("b")], 1, Time::ZERO);
        assert_eq!(v.world().markers().len(), 2);

        // Same revision: no rebuild.
        assert!(v.sync_articles(&[], 1, Time::ZERO).is_none());
        assert_eq!(v.world().markers().len(), 2);

        let stats = v.sync_articles(&[far_side_article("b")], 2, Time(1.0)).unwrap();
        assert_eq!(stats.removed, 2);
        let uris: Vec<&str> = v
            .world()
            .markers()
            .iter()
            .map(|(_, _, info)| info.uri.as_str())
            .collect();
        assert_eq!(uris, vec!["b"]);
    }

    #[test]
    fn wheel_is_consumed_only_over_globe() {
        let mut v = view();
        v.pointer_move(CORNER, ORIGIN, SIZE, 0.0);
        v.frame(Time(0.0));
        assert!(!v.wheel(120.0));

        v.pointer_move(CENTER, ORIGIN, SIZE, 0.1);
        v.frame(Time(0.1));
        v.frame(Time(0.2));
        assert!(v.wheel(120.0));
    }

    #[test]
    fn render_frame_tracks_markers_and_teardown_empties_world() {
        let mut v = view();
        v.sync_articles(&[facing_article("a")], 1, Time::ZERO);
        let out = v.frame(Time(2.0));
        assert_eq!(out.render.markers.len(), 1);
        assert_eq!(out.render.sphere_count(), 4);
        assert_eq!(v.stars().len(), 50);
        v.teardown();
    }

    #[test]
    fn star_vertices_mirror_the_starfield() {
        let v = view();
        let verts = v.star_vertices();
        assert_eq!(verts.len(), v.stars().len());
        let first = v.stars()[0];
        assert_eq!(verts[0].position, first.position.to_f32());
        assert_eq!(verts[0].color, [first.color.r, first.color.g, first.color.b]);
    }
}
