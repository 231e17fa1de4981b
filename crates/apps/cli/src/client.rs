use feed::api::{check_status, decode_articles, decode_search};
use feed::{ApiConfig, ApiError, Article, FeedError, PageRequest};
use reqwest::Client;
use tracing::debug;

/// Upper bound on cursor pages followed by one `--all` load.
pub const MAX_PAGES: usize = 50;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    api: ApiConfig,
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

impl ApiClient {
    pub fn new(api: ApiConfig) -> Self {
        Self {
            http: Client::new(),
            api,
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        debug!(%url, "GET");
        let resp = self.http.get(url).send().await.map_err(transport)?;
        check_status(resp.status().as_u16())?;
        resp.text().await.map_err(transport)
    }

    /// `GET /articles`; with `follow` the `next` cursor is chased.
    pub async fn articles(&self, limit: Option<u32>, follow: bool) -> Result<Vec<Article>, FeedError> {
        let mut page = PageRequest { limit, after: None };
        let mut out = Vec::new();
        for n in 0..MAX_PAGES {
            let url = self.api.articles_url(&page)?;
            let decoded = decode_articles(&self.get_text(url.as_str()).await?)?;
            debug!(page = n, count = decoded.articles.len(), "articles page");
            out.extend(decoded.articles);
            match decoded.next {
                Some(next) if follow => page.after = Some(next),
                _ => break,
            }
        }
        Ok(out)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Article>, FeedError> {
        let url = self.api.search_url(query)?;
        Ok(decode_search(&self.get_text(url.as_str()).await?)?)
    }
}
