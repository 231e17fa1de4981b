use serde::{Deserialize, Deserializer, Serialize};

/// Missing and `null` both decode to the default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A labelled point in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLngLabel {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wgt: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

impl Concept {
    pub fn is_location(&self) -> bool {
        self.kind == "loc"
    }
}

/// Normalized article as consumed by the globe and the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub uri: String,
    pub title: String,
    pub summary: String,
    pub image: String,
    /// In `[-1, 1]`; positive is good news.
    pub sentiment: f64,
    /// `YYYY-MM-DD` as delivered by the API; may be empty.
    pub event_date: String,
    pub social_score: f64,
    pub wgt: f64,
    pub categories: Vec<Category>,
    pub concepts: Vec<Concept>,
    pub main_location: Option<LatLngLabel>,
    pub locations: Vec<LatLngLabel>,
    /// Outbound link to the source article.
    pub url: Option<String>,
    pub composite_score: f64,
    pub total_article_count: f64,
}

impl Article {
    /// Outbound link if present and non-empty.
    pub fn link(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn event_day(&self) -> Option<chrono::NaiveDate> {
        let day = self.event_date.get(..10).unwrap_or(&self.event_date);
        chrono::NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    #[cfg(test)]
    pub(crate) fn fixture(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            title: format!("Title {uri}"),
            summary: String::new(),
            image: String::new(),
            sentiment: 0.0,
            event_date: String::new(),
            social_score: 0.0,
            wgt: 0.0,
            categories: Vec::new(),
            concepts: Vec::new(),
            main_location: None,
            locations: Vec::new(),
            url: None,
            composite_score: 0.0,
            total_article_count: 0.0,
        }
    }
}
