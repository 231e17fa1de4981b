use crate::article::Article;

pub const HEADLINE_COUNT: usize = 10;
pub const CATEGORIES: [&str; 5] = ["Breaking", "Business", "Technology", "Science", "Politics"];
pub const DEFAULT_CATEGORY: &str = "All";

/// Carousel of the leading articles with a category selector.
///
/// The category only tracks which tab is active; it does not filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Headlines {
    active_category: String,
}

impl Default for Headlines {
    fn default() -> Self {
        Self {
            active_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

impl Headlines {
    pub fn events<'a>(&self, articles: &'a [Article]) -> &'a [Article] {
        &articles[..articles.len().min(HEADLINE_COUNT)]
    }

    pub fn categories(&self) -> &'static [&'static str] {
        &CATEGORIES
    }

    pub fn active_category(&self) -> &str {
        &self.active_category
    }

    pub fn select(&mut self, category: &str) {
        self.active_category = category.to_string();
    }

    pub fn is_active(&self, category: &str) -> bool {
        self.active_category == category
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_CATEGORY, HEADLINE_COUNT, Headlines};
    use crate::article::Article;

    #[test]
    fn takes_first_ten() {
        let list: Vec<Article> = (0..15).map(|i| Article::fixture(&i.to_string())).collect();
        let headlines = Headlines::default();
        let events = headlines.events(&list);
        assert_eq!(events.len(), HEADLINE_COUNT);
        assert_eq!(events[0].uri, "0");
        assert_eq!(headlines.events(&list[..3]).len(), 3);
    }

    #[test]
    fn category_selection() {
        let mut headlines = Headlines::default();
        assert_eq!(headlines.active_category(), DEFAULT_CATEGORY);
        assert!(!headlines.is_active("Science"));
        headlines.select("Science");
        assert!(headlines.is_active("Science"));
        assert_eq!(headlines.categories().len(), 5);
    }
}
