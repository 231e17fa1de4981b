/// Which location reference of an article a marker stands for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// The article's geocoded main location.
    Main,
    /// A location concept mentioned in the article.
    Secondary,
}

/// Back-reference from a marker entity to the article it represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerInfo {
    pub uri: String,
    pub title: String,
    pub image: String,
    pub url: Option<String>,
    pub kind: MarkerKind,
}

impl MarkerInfo {
    /// Outbound link, if the article has a non-empty one.
    pub fn link(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::{MarkerInfo, MarkerKind};

    #[test]
    fn empty_url_is_not_a_link() {
        let mut info = MarkerInfo {
            uri: "a-1".into(),
            title: "Floods".into(),
            image: String::new(),
            url: Some(String::new()),
            kind: MarkerKind::Main,
        };
        assert_eq!(info.link(), None);
        info.url = Some("https://example.org/a".into());
        assert_eq!(info.link(), Some("https://example.org/a"));
    }
}
