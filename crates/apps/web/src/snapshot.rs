//! JSON views of app state handed to the host page.

use feed::paging::PageItem;
use feed::query::LabelFilter;
use feed::{Article, FeedState};
use runtime::event_bus::{Event, GlobeEvent};
use scene::components::MarkerKind;
use serde::Serialize;
use serde_json::{Value, json};

use crate::globe_view::Hover;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PageEntry {
    Page(usize),
    Ellipsis(&'static str),
}

impl From<PageItem> for PageEntry {
    fn from(item: PageItem) -> Self {
        match item {
            PageItem::Page(n) => PageEntry::Page(n),
            PageItem::Ellipsis => PageEntry::Ellipsis("…"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlinesSnapshot<'a> {
    pub events: &'a [Article],
    pub categories: &'static [&'static str],
    pub active_category: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot<'a> {
    /// Articles on the current page.
    pub articles: &'a [Article],
    pub visible_count: usize,
    pub page: usize,
    pub total_pages: usize,
    pub pages: Vec<PageEntry>,
    pub has_previous: bool,
    pub has_next: bool,
    pub loading: bool,
    pub error: Option<&'a str>,
    pub location_filter: &'a str,
    pub concept_filter: &'a str,
    pub sort: &'static str,
    pub concepts: Vec<String>,
    pub locations: Vec<String>,
    pub headlines: HeadlinesSnapshot<'a>,
}

fn filter_label(filter: &LabelFilter) -> &str {
    match filter {
        LabelFilter::Any => feed::query::ANY,
        LabelFilter::Is(label) => label,
    }
}

impl<'a> FeedSnapshot<'a> {
    pub fn capture(state: &'a FeedState) -> Self {
        let pager = state.pager();
        Self {
            articles: state.current_page(),
            visible_count: state.visible().len(),
            page: pager.current,
            total_pages: pager.total,
            pages: pager.items().into_iter().map(PageEntry::from).collect(),
            has_previous: pager.has_previous(),
            has_next: pager.has_next(),
            loading: state.is_loading(),
            error: state.error(),
            location_filter: filter_label(&state.filters().location),
            concept_filter: filter_label(&state.filters().concept),
            sort: state.sort().as_str(),
            concepts: state.available_concepts(),
            locations: state.available_locations(),
            headlines: HeadlinesSnapshot {
                events: state.headline_events(),
                categories: state.headlines().categories(),
                active_category: state.headlines().active_category(),
            },
        }
    }
}

pub fn feed_json(state: &FeedState) -> String {
    serde_json::to_string(&FeedSnapshot::capture(state)).unwrap_or_else(|_| "{}".to_string())
}

fn kind_str(kind: MarkerKind) -> &'static str {
    match kind {
        MarkerKind::Main => "main",
        MarkerKind::Secondary => "secondary",
    }
}

/// Tooltip payload; `null` when nothing is hovered.
pub fn hover_value(hover: Option<&Hover>) -> Value {
    match hover {
        None => Value::Null,
        Some(h) => json!({
            "uri": h.info.uri,
            "title": h.info.title,
            "image": h.info.image,
            "url": h.info.link(),
            "kind": kind_str(h.info.kind),
            "x": h.tooltip.x,
            "y": h.tooltip.y,
        }),
    }
}

pub fn event_value(event: &Event) -> Value {
    let mut v = json!({
        "frame": event.frame_index,
        "kind": event.event.kind(),
    });
    match &event.event {
        GlobeEvent::HoverChanged { uri } => v["uri"] = json!(uri),
        GlobeEvent::OpenUrl { url } => v["url"] = json!(url),
        GlobeEvent::MarkersRebuilt { count } => v["count"] = json!(count),
        GlobeEvent::SpinPaused | GlobeEvent::SpinResumed => {}
    }
    v
}

#[cfg(test)]
mod tests {
    use super::{FeedSnapshot, PageEntry, event_value, feed_json, hover_value};
    use crate::globe_view::Hover;
    use feed::query::{Filters, LabelFilter, SortKey};
    use feed::{Article, FeedState};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;
    use runtime::event_bus::{Event, GlobeEvent};
    use scene::components::{MarkerInfo, MarkerKind};
    use serde_json::json;

    fn article(i: usize) -> Article {
        let mut a: Article = serde_json::from_value(json!({
            "uri": format!("a{i}"),
            "title": format!("Article {i}"),
            "summary": "",
            "image": "",
            "sentiment": 0.0,
            "eventDate": "",
            "socialScore": 0.0,
            "wgt": 0.0,
            "categories": [],
            "concepts": [],
            "mainLocation": null,
            "locations": [],
            "url": null,
            "compositeScore": 0.0,
            "totalArticleCount": 0.0
        }))
        .unwrap();
        a.locations.push(feed::LatLngLabel {
            label: if i % 2 == 0 { "Kenya" } else { "Peru" }.to_string(),
            latitude: 0.0,
            longitude: 0.0,
        });
        a
    }

    fn state_with(n: usize) -> FeedState {
        let mut s = FeedState::new();
        s.replace_articles((0..n).map(article).collect());
        s
    }

    #[test]
    fn snapshot_pages_and_filters() {
        let mut s = state_with(45);
        s.go_to_page(3);
        let snap = FeedSnapshot::capture(&s);
        assert_eq!(snap.page, 3);
        assert_eq!(snap.total_pages, 5);
        assert_eq!(snap.articles.len(), 10);
        assert_eq!(snap.articles[0].uri, "a20");
        assert!(snap.has_previous && snap.has_next);
        assert_eq!(snap.location_filter, "Any");
        assert_eq!(snap.locations, vec!["Kenya".to_string(), "Peru".to_string()]);
        assert_eq!(snap.headlines.events.len(), 10);
        assert_eq!(snap.headlines.active_category, "All");

        s.set_filters(Filters {
            location: LabelFilter::Is("Peru".into()),
            concept: LabelFilter::Any,
        });
        s.set_sort(SortKey::Sentiment);
        let snap = FeedSnapshot::capture(&s);
        assert_eq!(snap.location_filter, "Peru");
        assert_eq!(snap.visible_count, 22);
        assert_eq!(snap.page, 1);
        assert_eq!(snap.sort, "sentiment");
    }

    #[test]
    fn page_list_serializes_numbers_and_ellipsis() {
        let mut s = state_with(100);
        s.go_to_page(5);
        let v: serde_json::Value = serde_json::from_str(&feed_json(&s)).unwrap();
        assert_eq!(v["pages"], json!([1, "…", 4, 5, 6, "…", 10]));
        assert_eq!(v["totalPages"], json!(10));
        assert_eq!(PageEntry::from(feed::paging::PageItem::Page(2)), PageEntry::Page(2));
    }

    #[test]
    fn hover_payload_includes_tooltip_position() {
        assert_eq!(hover_value(None), serde_json::Value::Null);
        let hover = Hover {
            info: MarkerInfo {
                uri: "u".into(),
                title: "Floods".into(),
                image: "img.jpg".into(),
                url: Some(String::new()),
                kind: MarkerKind::Secondary,
            },
            tooltip: Vec2::new(10.0, 20.0),
        };
        let v = hover_value(Some(&hover));
        assert_eq!(v["title"], json!("Floods"));
        assert_eq!(v["url"], serde_json::Value::Null);
        assert_eq!(v["kind"], json!("secondary"));
        assert_eq!((v["x"].clone(), v["y"].clone()), (json!(10.0), json!(20.0)));
    }

    #[test]
    fn events_carry_their_payload() {
        let e = Event {
            frame_index: 7,
            event: GlobeEvent::OpenUrl {
                url: "https://example.org".into(),
            },
        };
        let v = event_value(&e);
        assert_eq!(v["frame"], json!(7));
        assert_eq!(v["kind"], json!("open_url"));
        assert_eq!(v["url"], json!("https://example.org"));
    }
}
