//! Plain-text and JSON rendering of feed pages and markers.

use feed::paging::{PageItem, Pager};
use feed::{Article, FeedState};
use foundation::math::{Rgb, sphere_to_lat_lon};
use scene::components::MarkerKind;
use scene::prefabs::MarkerSpawn;
use serde_json::{Value, json};

pub fn hex(c: Rgb) -> String {
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", byte(c.r), byte(c.g), byte(c.b))
}

pub fn article_line(index: usize, a: &Article) -> String {
    let date = if a.event_date.is_empty() {
        "----------"
    } else {
        a.event_date.get(..10).unwrap_or(&a.event_date)
    };
    let mut line = format!("{index:>3}. {date}  {}  ({:+.2})", a.title, a.sentiment);
    if let Some(url) = a.link() {
        line.push_str("\n     ");
        line.push_str(url);
    }
    line
}

pub fn page_footer(pager: Pager) -> String {
    let mut out = format!("page {}/{}", pager.current, pager.total.max(1));
    let items = pager.items();
    if !items.is_empty() {
        let buttons: Vec<String> = items
            .into_iter()
            .map(|item| match item {
                PageItem::Page(n) if n == pager.current => format!("[{n}]"),
                PageItem::Page(n) => n.to_string(),
                PageItem::Ellipsis => "…".to_string(),
            })
            .collect();
        out.push_str("  ");
        out.push_str(&buttons.join(" "));
    }
    out
}

pub fn page_text(state: &FeedState) -> String {
    let pager = state.pager();
    let first = (pager.current.max(1) - 1) * feed::paging::ITEMS_PER_PAGE;
    let mut lines: Vec<String> = state
        .current_page()
        .iter()
        .enumerate()
        .map(|(i, a)| article_line(first + i + 1, a))
        .collect();
    if lines.is_empty() {
        lines.push("no articles".to_string());
    }
    lines.push(page_footer(pager));
    lines.join("\n")
}

pub fn page_json(state: &FeedState) -> Result<String, serde_json::Error> {
    let pager = state.pager();
    serde_json::to_string_pretty(&json!({
        "page": pager.current,
        "totalPages": pager.total,
        "total": state.visible().len(),
        "articles": state.current_page(),
    }))
}

fn kind_str(kind: MarkerKind) -> &'static str {
    match kind {
        MarkerKind::Main => "main",
        MarkerKind::Secondary => "secondary",
    }
}

pub fn marker_line(spawn: &MarkerSpawn) -> String {
    let (lat, lon) = sphere_to_lat_lon(spawn.position)
        .map(|p| (p.lat_deg, p.lon_deg))
        .unwrap_or_default();
    format!(
        "{:<9} {lat:>7.2} {lon:>8.2}  h={:.3}  {}  {}",
        kind_str(spawn.info.kind),
        spawn.size.z,
        hex(spawn.material.color),
        spawn.info.title
    )
}

pub fn marker_value(spawn: &MarkerSpawn) -> Value {
    let ll = sphere_to_lat_lon(spawn.position);
    json!({
        "uri": spawn.info.uri,
        "kind": kind_str(spawn.info.kind),
        "lat": ll.map(|p| p.lat_deg),
        "lon": ll.map(|p| p.lon_deg),
        "height": spawn.size.z,
        "color": hex(spawn.material.color),
        "opacity": spawn.material.opacity,
    })
}

pub fn headlines_text(state: &FeedState) -> String {
    let headlines = state.headlines();
    let tabs: Vec<String> = headlines
        .categories()
        .iter()
        .map(|c| {
            if headlines.is_active(c) {
                format!("[{c}]")
            } else {
                c.to_string()
            }
        })
        .collect();
    let mut lines = vec![format!(
        "category: {}    {}",
        headlines.active_category(),
        tabs.join(" ")
    )];
    lines.extend(
        state
            .headline_events()
            .iter()
            .enumerate()
            .map(|(i, a)| article_line(i + 1, a)),
    );
    lines.join("\n")
}
