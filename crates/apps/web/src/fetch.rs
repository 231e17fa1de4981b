use feed::api::{check_status, decode_articles, decode_search};
use feed::{ApiConfig, ApiError, Article, FeedError, PageRequest};
use gloo_net::http::{Request, Response};

fn transport(e: gloo_net::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

async fn get(url: &str) -> Result<Response, ApiError> {
    let resp = Request::get(url).send().await.map_err(transport)?;
    check_status(resp.status())?;
    Ok(resp)
}

pub async fn fetch_articles(api: &ApiConfig) -> Result<Vec<Article>, FeedError> {
    let url = api.articles_url(&PageRequest::default())?;
    let body = get(url.as_str()).await?.text().await.map_err(transport)?;
    Ok(decode_articles(&body)?.articles)
}

pub async fn fetch_search(api: &ApiConfig, query: &str) -> Result<Vec<Article>, FeedError> {
    let url = api.search_url(query)?;
    let body = get(url.as_str()).await?.text().await.map_err(transport)?;
    Ok(decode_search(&body)?)
}

pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, ApiError> {
    get(url).await?.binary().await.map_err(transport)
}
