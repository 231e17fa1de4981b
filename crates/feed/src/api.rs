//! Endpoints of the article API and decoding of its responses.
//!
//! Transport lives in the apps (`gloo-net` in the browser, `reqwest` in the
//! CLI); this module only builds URLs and turns bodies into articles.

use serde::Deserialize;
use url::Url;

use crate::article::Article;
use crate::error::ApiError;
use crate::format::{RawArticle, RawSearchHit, format_article, format_search_hit};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const ARTICLES_PATH: &str = "articles";
pub const SEARCH_PATH: &str = "search";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Cursor paging for `GET /articles`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: Option<u32>,
    pub after: Option<String>,
}

/// One decoded `/articles` response.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    /// Cursor for the next page; `None` on the last page or for bare arrays.
    pub next: Option<String>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|e| ApiError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }

    pub fn articles_url(&self, page: &PageRequest) -> Result<Url, ApiError> {
        let mut url = self.endpoint(ARTICLES_PATH)?;
        if page.limit.is_some() || page.after.is_some() {
            let mut q = url.query_pairs_mut();
            if let Some(limit) = page.limit {
                q.append_pair("limit", &limit.to_string());
            }
            if let Some(after) = &page.after {
                q.append_pair("after", after);
            }
        }
        Ok(url)
    }

    pub fn search_url(&self, query: &str) -> Result<Url, ApiError> {
        let mut url = self.endpoint(SEARCH_PATH)?;
        url.query_pairs_mut().append_pair("query", query);
        Ok(url)
    }
}

/// Any 2xx is success.
pub fn check_status(status: u16) -> Result<(), ApiError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(ApiError::Status(status))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArticlesBody {
    Bare(Vec<RawArticle>),
    Paged {
        items: Vec<RawArticle>,
        #[serde(default)]
        next: Option<String>,
    },
}

pub fn decode_articles(body: &str) -> Result<ArticlePage, ApiError> {
    let (items, next) = match serde_json::from_str::<ArticlesBody>(body)? {
        ArticlesBody::Bare(items) => (items, None),
        ArticlesBody::Paged { items, next } => (items, next),
    };
    let articles: Vec<Article> = items.into_iter().map(format_article).collect();
    tracing::debug!(count = articles.len(), has_next = next.is_some(), "decoded articles");
    Ok(ArticlePage { articles, next })
}

pub fn decode_search(body: &str) -> Result<Vec<Article>, ApiError> {
    let hits: Vec<RawSearchHit> = serde_json::from_str(body)?;
    Ok(hits.into_iter().map(format_search_hit).collect())
}

#[cfg(test)]
mod tests {
    use super::{ApiConfig, PageRequest, check_status, decode_articles, decode_search};
    use crate::error::ApiError;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_endpoint_urls() {
        let api = ApiConfig::new("http://localhost:5000/");
        assert_eq!(
            api.articles_url(&PageRequest::default()).unwrap().as_str(),
            "http://localhost:5000/articles"
        );
        let paged = PageRequest {
            limit: Some(50),
            after: Some("c/1".into()),
        };
        assert_eq!(
            api.articles_url(&paged).unwrap().as_str(),
            "http://localhost:5000/articles?limit=50&after=c%2F1"
        );
        assert_eq!(
            api.search_url("sea level & ice").unwrap().as_str(),
            "http://localhost:5000/search?query=sea+level+%26+ice"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let api = ApiConfig::new("https://api.example.org/prod");
        assert_eq!(
            api.search_url("x").unwrap().as_str(),
            "https://api.example.org/prod/search?query=x"
        );
    }

    #[test]
    fn relative_base_is_rejected() {
        let err = ApiConfig::new("").articles_url(&PageRequest::default());
        assert!(matches!(err, Err(ApiError::InvalidUrl { .. })));
    }

    #[test]
    fn decodes_bare_and_paged_bodies() {
        let bare = decode_articles(r#"[{"uri":"a"},{"uri":"b"}]"#).unwrap();
        assert_eq!(bare.articles.len(), 2);
        assert_eq!(bare.next, None);

        let paged = decode_articles(r#"{"items":[{"uri":"a"}],"next":"abc"}"#).unwrap();
        assert_eq!(paged.articles[0].uri, "a");
        assert_eq!(paged.next.as_deref(), Some("abc"));

        let last = decode_articles(r#"{"items":[],"next":null}"#).unwrap();
        assert_eq!(last.next, None);
    }

    #[test]
    fn search_hits_with_untidy_fields_still_decode() {
        let hits = decode_search(
            r#"[{"_score":1.0,"_source":{"uri":"a","images":[null],"categories":[{}]}},
                {"_score":2.0,"_source":{"uri":"b"}}]"#,
        )
        .unwrap();
        let uris: Vec<&str> = hits.iter().map(|a| a.uri.as_str()).collect();
        assert_eq!(uris, vec!["a", "b"]);
        assert_eq!(hits[0].image, "");
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        assert!(matches!(
            decode_articles("{\"oops\":1}"),
            Err(ApiError::Decode(_))
        ));
        assert!(matches!(decode_search("nope"), Err(ApiError::Decode(_))));
    }

    #[test]
    fn non_2xx_is_an_error() {
        assert!(check_status(204).is_ok());
        assert!(matches!(check_status(404), Err(ApiError::Status(404))));
    }
}
