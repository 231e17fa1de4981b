use std::collections::HashSet;

use feed::Article;
use foundation::math::{LatLon, Vec3, lat_lon_to_sphere};
use foundation::time::Time;
use rand::Rng;
use scene::World;
use scene::components::{MarkerInfo, MarkerKind};
use scene::prefabs::{GlobeScene, MarkerSpawn};

use crate::layer::{Layer, LayerId};
use crate::symbology::{MARKER_RADIUS, MarkerMotion, MarkerStyle};

/// Half-width of the longitude jitter band (degrees).
pub const JITTER_SPAN_DEG: f64 = 3.0;

/// Source of the longitude offset that keeps co-located markers apart.
pub trait Jitter {
    /// Offset in degrees.
    fn longitude_offset(&mut self) -> f64;
}

/// Uniform in `[-1.5°, 1.5°)`.
#[derive(Debug)]
pub struct RandomJitter<R> {
    rng: R,
}

impl<R: Rng> RandomJitter<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Jitter for RandomJitter<R> {
    fn longitude_offset(&mut self) -> f64 {
        (self.rng.r#gen::<f64>() - 0.5) * JITTER_SPAN_DEG
    }
}

/// Constant offset; zero places markers exactly.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl Jitter for FixedJitter {
    fn longitude_offset(&mut self) -> f64 {
        self.0
    }
}

pub fn marker_position(lat_deg: f64, lon_deg: f64, jitter: &mut dyn Jitter) -> Vec3 {
    let offset = jitter.longitude_offset();
    lat_lon_to_sphere(LatLon::new(lat_deg, lon_deg + offset), MARKER_RADIUS)
}

fn info(article: &Article, kind: MarkerKind) -> MarkerInfo {
    MarkerInfo {
        uri: article.uri.clone(),
        title: article.title.clone(),
        image: article.image.clone(),
        url: article.url.clone(),
        kind,
    }
}

/// Marker boxes for one article: the main location (if any), then one per
/// location concept.
pub fn article_markers(
    article: &Article,
    is_new: bool,
    now: Time,
    jitter: &mut dyn Jitter,
) -> Vec<MarkerSpawn> {
    let mut out = Vec::with_capacity(1 + article.locations.len());

    if let Some(main) = &article.main_location {
        let style = MarkerStyle::main(article);
        out.push(MarkerSpawn {
            position: marker_position(main.latitude, main.longitude, jitter),
            size: style.size(),
            material: style.material(),
            info: info(article, MarkerKind::Main),
            animation: MarkerMotion::MAIN.animation(now, article.social_score, is_new),
        });
    }

    let style = MarkerStyle::secondary();
    for loc in &article.locations {
        out.push(MarkerSpawn {
            position: marker_position(loc.latitude, loc.longitude, jitter),
            size: style.size(),
            material: style.material(),
            info: info(article, MarkerKind::Secondary),
            // Secondary markers grow in on every rebuild.
            animation: MarkerMotion::SECONDARY.animation(now, article.social_score, true),
        });
    }
    out
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RebuildStats {
    pub removed: usize,
    pub spawned: usize,
}

/// Keeps the globe's markers in step with the active article list.
#[derive(Debug, Clone)]
pub struct MarkerLayer {
    id: LayerId,
    known: HashSet<String>,
}

impl MarkerLayer {
    pub fn new(id: u64) -> Self {
        Self {
            id: LayerId(id),
            known: HashSet::new(),
        }
    }

    /// An article seen in the previous rebuild.
    pub fn is_known(&self, uri: &str) -> bool {
        self.known.contains(uri)
    }

    /// Replace every marker with markers for `articles`.
    ///
    /// Old markers are despawned before any new one is attached, so the
    /// globe never holds two hit targets for a stale article.
    pub fn rebuild(
        &mut self,
        world: &mut World,
        globe: &mut GlobeScene,
        articles: &[Article],
        now: Time,
        jitter: &mut dyn Jitter,
    ) -> RebuildStats {
        let removed = globe.clear_markers(world);

        let mut spawned = 0;
        for article in articles {
            let is_new = !self.is_known(&article.uri);
            for spawn in article_markers(article, is_new, now, jitter) {
                globe.spawn_marker(world, spawn, now);
                spawned += 1;
            }
        }

        self.known = articles.iter().map(|a| a.uri.clone()).collect();
        tracing::debug!(removed, spawned, articles = articles.len(), "markers rebuilt");
        RebuildStats { removed, spawned }
    }
}

impl Layer for MarkerLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn name(&self) -> &'static str {
        "markers"
    }
}

#[cfg(test)]
mod tests {
    use super::{FixedJitter, Jitter, MarkerLayer, RandomJitter, article_markers, marker_position};
    use feed::{Article, LatLngLabel};
    use foundation::time::Time;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use scene::World;
    use scene::components::{GROW_FROM, MarkerKind};
    use scene::prefabs::GlobeScene;

    fn article(uri: &str, main: Option<(f64, f64)>, extra: usize) -> Article {
        let mut a = feed::format::format_article(feed::format::RawArticle {
            uri: Some(uri.into()),
            ..Default::default()
        });
        a.main_location = main.map(|(lat, lon)| LatLngLabel {
            label: "main".into(),
            latitude: lat,
            longitude: lon,
        });
        a.locations = (0..extra)
            .map(|i| LatLngLabel {
                label: format!("loc{i}"),
                latitude: i as f64,
                longitude: 10.0,
            })
            .collect();
        a.url = Some(format!("https://news/{uri}"));
        a
    }

    #[test]
    fn north_pole_marker_sits_on_top() {
        let p = marker_position(90.0, 123.0, &mut FixedJitter(1.2));
        assert!(p.x.abs() < 1e-12 && p.z.abs() < 1e-12);
        assert!((p.y - 1.02).abs() < 1e-12);
    }

    #[test]
    fn random_jitter_stays_in_band() {
        let mut jitter = RandomJitter::new(StdRng::seed_from_u64(7));
        for _ in 0..1000 {
            let d = jitter.longitude_offset();
            assert!((-1.5..1.5).contains(&d));
        }
    }

    #[test]
    fn main_and_secondary_markers() {
        let a = article("a", Some((10.0, 20.0)), 2);
        let spawns = article_markers(&a, true, Time::ZERO, &mut FixedJitter(0.0));
        assert_eq!(spawns.len(), 3);
        assert_eq!(spawns[0].info.kind, MarkerKind::Main);
        assert_eq!(spawns[0].material.opacity, 0.8);
        assert_eq!(spawns[1].info.kind, MarkerKind::Secondary);
        assert_eq!(spawns[1].material.opacity, 0.4);
        assert_eq!(spawns[1].info.url.as_deref(), Some("https://news/a"));

        let none = article("b", None, 0);
        assert!(article_markers(&none, true, Time::ZERO, &mut FixedJitter(0.0)).is_empty());
    }

    #[test]
    fn rebuild_replaces_markers_and_tracks_known() {
        let mut world = World::new();
        let mut globe = GlobeScene::spawn(&mut world, 0);
        let mut layer = MarkerLayer::new(1);
        let mut jitter = FixedJitter(0.0);

        let first = vec![article("a", Some((1.0, 1.0)), 1), article("b", Some((2.0, 2.0)), 0)];
        let stats = layer.rebuild(&mut world, &mut globe, &first, Time::ZERO, &mut jitter);
        assert_eq!(stats.removed, 0);
        assert_eq!(stats.spawned, 3);
        assert!(layer.is_known("a"));

        let second = vec![article("b", Some((2.0, 2.0)), 0), article("c", Some((3.0, 3.0)), 0)];
        let stats = layer.rebuild(&mut world, &mut globe, &second, Time(5.0), &mut jitter);
        assert_eq!(stats.removed, 3);
        assert_eq!(stats.spawned, 2);
        assert!(!layer.is_known("a"));

        let markers = world.markers();
        assert_eq!(markers.len(), 2);
        assert!(markers.iter().all(|(_, _, info)| info.uri != "a"));

        // Known "b" oscillates immediately, new "c" grows in.
        for (entity, _, info) in &markers {
            let anim = world.animation(*entity).unwrap();
            let scale = anim.scale_z(Time(5.0));
            match info.uri.as_str() {
                "b" => assert!((scale - 1.0).abs() < 1e-9),
                "c" => assert_eq!(scale, GROW_FROM),
                other => panic!("unexpected marker {other}"),
            }
        }
    }
}
