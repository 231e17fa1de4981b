//! Raw API records → [`Article`].

use serde::Deserialize;

use crate::article::{Article, Category, Concept, GeoPoint, LatLngLabel};

/// Location concepts need a relevance above this to become markers.
pub const LOCATION_SCORE_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LangText {
    pub eng: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLocation {
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub label: Option<LangText>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConcept {
    pub label: Option<LangText>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub score: Option<f64>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLink {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawInfoArticle {
    pub eng: Option<RawLink>,
}

/// Article document as stored by the search backend.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub uri: Option<String>,
    pub title: Option<LangText>,
    pub summary: Option<LangText>,
    /// Entries may be `null`; only the first one is shown.
    pub images: Option<Vec<Option<String>>>,
    pub sentiment: Option<f64>,
    pub event_date: Option<String>,
    pub social_score: Option<f64>,
    pub wgt: Option<f64>,
    pub categories: Option<Vec<Category>>,
    pub concepts: Option<Vec<RawConcept>>,
    pub location: Option<RawLocation>,
    pub info_article: Option<RawInfoArticle>,
    pub total_article_count: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchHit {
    #[serde(rename = "_score")]
    pub score: Option<f64>,
    #[serde(rename = "_source")]
    pub source: RawArticle,
}

fn eng(text: Option<&LangText>) -> String {
    text.and_then(|t| t.eng.clone()).unwrap_or_default()
}

fn truthy(v: Option<f64>) -> Option<f64> {
    v.filter(|v| *v != 0.0 && !v.is_nan())
}

pub fn format_article(raw: RawArticle) -> Article {
    let main_location = raw.location.as_ref().and_then(|loc| {
        let latitude = truthy(loc.lat)?;
        let longitude = truthy(loc.long)?;
        Some(LatLngLabel {
            label: eng(loc.label.as_ref()),
            latitude,
            longitude,
        })
    });

    let concepts: Vec<Concept> = raw
        .concepts
        .unwrap_or_default()
        .into_iter()
        .map(|c| Concept {
            label: eng(c.label.as_ref()),
            kind: c.kind.unwrap_or_default(),
            score: c.score.unwrap_or(0.0),
            location: c.location,
        })
        .collect();

    let locations = concepts
        .iter()
        .filter(|c| c.is_location() && c.score > LOCATION_SCORE_THRESHOLD)
        .map(|c| {
            let point = c.location.unwrap_or_default();
            LatLngLabel {
                label: c.label.clone(),
                latitude: point.lat.unwrap_or(0.0),
                longitude: point.long.unwrap_or(0.0),
            }
        })
        .collect();

    let wgt = raw.wgt.unwrap_or(0.0);
    Article {
        uri: raw
            .uri
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        title: eng(raw.title.as_ref()),
        summary: eng(raw.summary.as_ref()),
        image: raw
            .images
            .and_then(|imgs| imgs.into_iter().next())
            .flatten()
            .unwrap_or_default(),
        sentiment: raw.sentiment.unwrap_or(0.0),
        event_date: raw.event_date.unwrap_or_default(),
        social_score: raw.social_score.unwrap_or(0.0),
        wgt,
        categories: raw.categories.unwrap_or_default(),
        concepts,
        main_location,
        locations,
        url: raw.info_article.and_then(|i| i.eng).and_then(|l| l.url),
        composite_score: wgt,
        total_article_count: raw.total_article_count.unwrap_or(0.0),
    }
}

/// Search hits rank by a blend of coverage, weight and text relevance.
pub fn search_composite_score(total_article_count: f64, wgt: f64, score: f64) -> f64 {
    0.2 * total_article_count + 0.2 * wgt + 0.6 * score
}

pub fn format_search_hit(hit: RawSearchHit) -> Article {
    let score = hit.score.unwrap_or(0.0);
    let mut article = format_article(hit.source);
    article.composite_score =
        search_composite_score(article.total_article_count, article.wgt, score);
    article
}
