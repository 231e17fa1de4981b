use std::collections::HashSet;

use foundation::math::precision::stable_total_cmp_f64;

use crate::article::Article;

/// Sentinel used by the filter dropdowns.
pub const ANY: &str = "Any";

/// A single dropdown: either everything or one exact label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LabelFilter {
    #[default]
    Any,
    Is(String),
}

impl LabelFilter {
    /// `"Any"` (or empty) selects everything.
    pub fn parse(value: &str) -> Self {
        if value.is_empty() || value == ANY {
            LabelFilter::Any
        } else {
            LabelFilter::Is(value.to_string())
        }
    }

    fn admits<'a>(&self, mut labels: impl Iterator<Item = &'a str>) -> bool {
        match self {
            LabelFilter::Any => true,
            LabelFilter::Is(want) => labels.any(|l| l == want),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filters {
    pub location: LabelFilter,
    pub concept: LabelFilter,
}

impl Filters {
    pub fn matches(&self, article: &Article) -> bool {
        self.location
            .admits(article.locations.iter().map(|l| l.label.as_str()))
            && self
                .concept
                .admits(article.concepts.iter().map(|c| c.label.as_str()))
    }

    pub fn apply(&self, articles: &[Article]) -> Vec<Article> {
        articles
            .iter()
            .filter(|a| self.matches(a))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    None,
    /// Newest first.
    Date,
    /// Oldest first.
    DateDesc,
    /// Most positive first.
    Sentiment,
    /// Most negative first.
    SentimentDesc,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "None" => Some(SortKey::None),
            "date" => Some(SortKey::Date),
            "date-desc" => Some(SortKey::DateDesc),
            "sentiment" => Some(SortKey::Sentiment),
            "sentiment-desc" => Some(SortKey::SentimentDesc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::None => "None",
            SortKey::Date => "date",
            SortKey::DateDesc => "date-desc",
            SortKey::Sentiment => "sentiment",
            SortKey::SentimentDesc => "sentiment-desc",
        }
    }

    /// Stable in-place sort. `None` leaves the order untouched.
    /// Undated articles count as the oldest.
    pub fn sort(self, articles: &mut [Article]) {
        let by_date = |a: &Article, b: &Article| a.event_day().cmp(&b.event_day());
        let by_sentiment =
            |a: &Article, b: &Article| stable_total_cmp_f64(a.sentiment, b.sentiment);
        match self {
            SortKey::None => {}
            SortKey::Date => articles.sort_by(|a, b| by_date(b, a)),
            SortKey::DateDesc => articles.sort_by(by_date),
            SortKey::Sentiment => articles.sort_by(|a, b| by_sentiment(b, a)),
            SortKey::SentimentDesc => articles.sort_by(by_sentiment),
        }
    }
}

/// Distinct labels in first-seen order.
fn distinct<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .filter(|l| seen.insert(*l))
        .map(str::to_string)
        .collect()
}

pub fn available_concepts(articles: &[Article]) -> Vec<String> {
    distinct(
        articles
            .iter()
            .flat_map(|a| a.concepts.iter().map(|c| c.label.as_str())),
    )
}

pub fn available_locations(articles: &[Article]) -> Vec<String> {
    distinct(
        articles
            .iter()
            .flat_map(|a| a.locations.iter().map(|l| l.label.as_str())),
    )
}

#[cfg(test)]
mod tests {
    use super::{Filters, LabelFilter, SortKey, available_concepts, available_locations};
    use crate::article::{Article, Concept, LatLngLabel};
    use pretty_assertions::assert_eq;

    fn article(uri: &str, date: &str, sentiment: f64, locs: &[&str], concepts: &[&str]) -> Article {
        let mut a = Article::fixture(uri);
        a.event_date = date.into();
        a.sentiment = sentiment;
        a.locations = locs
            .iter()
            .map(|l| LatLngLabel {
                label: l.to_string(),
                latitude: 1.0,
                longitude: 1.0,
            })
            .collect();
        a.concepts = concepts
            .iter()
            .map(|c| Concept {
                label: c.to_string(),
                kind: "wiki".into(),
                score: 0.0,
                location: None,
            })
            .collect();
        a
    }

    fn uris(list: &[Article]) -> Vec<&str> {
        list.iter().map(|a| a.uri.as_str()).collect()
    }

    fn sample() -> Vec<Article> {
        vec![
            article("a", "2024-01-02", 0.5, &["Paris"], &["Flood"]),
            article("b", "2024-01-05", -0.2, &["Oslo"], &["Flood", "Heat"]),
            article("c", "", 0.9, &["Paris", "Oslo"], &["Heat"]),
        ]
    }

    #[test]
    fn any_filters_keep_everything() {
        let list = sample();
        assert_eq!(Filters::default().apply(&list).len(), 3);
        assert_eq!(LabelFilter::parse("Any"), LabelFilter::Any);
    }

    #[test]
    fn filters_combine() {
        let list = sample();
        let f = Filters {
            location: LabelFilter::parse("Paris"),
            concept: LabelFilter::Any,
        };
        assert_eq!(uris(&f.apply(&list)), vec!["a", "c"]);

        let f = Filters {
            location: LabelFilter::parse("Oslo"),
            concept: LabelFilter::parse("Flood"),
        };
        assert_eq!(uris(&f.apply(&list)), vec!["b"]);
    }

    #[test]
    fn sorts() {
        let mut list = sample();
        SortKey::Date.sort(&mut list);
        assert_eq!(uris(&list), vec!["b", "a", "c"]);
        SortKey::DateDesc.sort(&mut list);
        assert_eq!(uris(&list), vec!["c", "a", "b"]);
        SortKey::Sentiment.sort(&mut list);
        assert_eq!(uris(&list), vec!["c", "a", "b"]);
        SortKey::SentimentDesc.sort(&mut list);
        assert_eq!(uris(&list), vec!["b", "a", "c"]);

        let before = uris(&list).join(",");
        SortKey::None.sort(&mut list);
        assert_eq!(uris(&list).join(","), before);
    }

    #[test]
    fn sort_key_names() {
        for key in [
            SortKey::None,
            SortKey::Date,
            SortKey::DateDesc,
            SortKey::Sentiment,
            SortKey::SentimentDesc,
        ] {
            assert_eq!(SortKey::parse(key.as_str()), Some(key));
        }
        assert_eq!(SortKey::parse("title"), None);
    }

    #[test]
    fn available_values_first_seen_order() {
        let list = sample();
        assert_eq!(available_locations(&list), vec!["Paris", "Oslo"]);
        assert_eq!(available_concepts(&list), vec!["Flood", "Heat"]);
    }
}
