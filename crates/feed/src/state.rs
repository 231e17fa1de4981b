//! Feed state: the active article list and every view derived from it.

use crate::article::Article;
use crate::cache::{ArticleCache, CacheLookup, KeyValueStore};
use crate::error::FeedError;
use crate::headlines::Headlines;
use crate::paging::{PageItem, Pager, page_slice};
use crate::query::{Filters, SortKey, available_concepts, available_locations};

/// Identifies one in-flight request. Only the latest token is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPlan {
    pub token: RequestToken,
    /// The cached list was applied; the fetch is a background refresh.
    pub served_from_cache: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A newer request was issued; the response was dropped.
    Stale,
    Failed,
}

#[derive(Debug)]
pub struct FeedState {
    articles: Vec<Article>,
    visible: Vec<Article>,
    filters: Filters,
    sort: SortKey,
    pager: Pager,
    headlines: Headlines,
    loading: bool,
    error: Option<String>,
    latest: u64,
    background: bool,
    revision: u64,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            articles: Vec::new(),
            visible: Vec::new(),
            filters: Filters::default(),
            sort: SortKey::None,
            pager: Pager::new(0),
            headlines: Headlines::default(),
            loading: true,
            error: None,
            latest: 0,
            background: false,
            revision: 0,
        }
    }
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Filtered and sorted list; this is what the globe shows.
    pub fn visible(&self) -> &[Article] {
        &self.visible
    }

    /// Bumped whenever [`visible`](Self::visible) changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn sort(&self) -> SortKey {
        self.sort
    }

    pub fn headlines(&self) -> &Headlines {
        &self.headlines
    }

    pub fn headlines_mut(&mut self) -> &mut Headlines {
        &mut self.headlines
    }

    pub fn headline_events(&self) -> &[Article] {
        self.headlines.events(&self.articles)
    }

    pub fn begin_request(&mut self) -> RequestToken {
        self.latest += 1;
        self.background = false;
        RequestToken(self.latest)
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }

    /// Start a load. A same-day cache hit (unless `force`) is applied at
    /// once and the returned token is for a background refresh.
    pub fn refresh<S: KeyValueStore>(
        &mut self,
        cache: &ArticleCache<S>,
        today: &str,
        force: bool,
    ) -> RefreshPlan {
        let token = self.begin_request();
        if !force && let CacheLookup::Fresh(cached) = cache.lookup(today) {
            tracing::debug!(count = cached.len(), "serving cached articles");
            self.replace_articles(cached);
            self.loading = false;
            self.background = true;
            return RefreshPlan {
                token,
                served_from_cache: true,
            };
        }
        self.loading = true;
        RefreshPlan {
            token,
            served_from_cache: false,
        }
    }

    /// Apply an `/articles` response and write it through to the cache.
    pub fn complete_refresh<S: KeyValueStore>(
        &mut self,
        token: RequestToken,
        result: Result<Vec<Article>, FeedError>,
        cache: &mut ArticleCache<S>,
        today: &str,
    ) -> Outcome {
        if !self.is_current(token) {
            tracing::debug!(?token, latest = self.latest, "dropping stale response");
            return Outcome::Stale;
        }
        self.loading = false;
        match result {
            Ok(fresh) => {
                if let Err(e) = cache.save(today, &fresh) {
                    tracing::warn!(error = %e, "article cache write failed");
                }
                self.error = None;
                self.replace_articles(fresh);
                Outcome::Applied
            }
            Err(e) if self.background => {
                tracing::warn!(error = %e, "background refresh failed; keeping cached list");
                Outcome::Failed
            }
            Err(e) => {
                self.error = Some(e.user_message());
                Outcome::Failed
            }
        }
    }

    /// Apply a `/search` response. Search results are not cached.
    pub fn complete_search(
        &mut self,
        token: RequestToken,
        result: Result<Vec<Article>, FeedError>,
    ) -> Outcome {
        if !self.is_current(token) {
            return Outcome::Stale;
        }
        self.loading = false;
        match result {
            Ok(hits) => {
                self.error = None;
                self.replace_articles(hits);
                Outcome::Applied
            }
            Err(e) => {
                self.error = Some(e.user_message());
                Outcome::Failed
            }
        }
    }

    /// New active list: filters reset, page 1.
    pub fn replace_articles(&mut self, articles: Vec<Article>) {
        self.articles = articles;
        self.filters = Filters::default();
        self.rebuild_visible();
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.filters = filters;
        self.rebuild_visible();
    }

    /// `SortKey::None` is a no-op and keeps the current order.
    pub fn set_sort(&mut self, sort: SortKey) {
        if sort == SortKey::None {
            return;
        }
        self.sort = sort;
        sort.sort(&mut self.visible);
        self.revision += 1;
    }

    fn rebuild_visible(&mut self) {
        self.visible = self.filters.apply(&self.articles);
        self.sort.sort(&mut self.visible);
        self.pager = Pager::new(self.visible.len());
        self.revision += 1;
    }

    pub fn available_concepts(&self) -> Vec<String> {
        available_concepts(&self.articles)
    }

    pub fn available_locations(&self) -> Vec<String> {
        available_locations(&self.articles)
    }

    pub fn pager(&self) -> Pager {
        self.pager
    }

    pub fn page_items(&self) -> Vec<PageItem> {
        self.pager.items()
    }

    pub fn current_page(&self) -> &[Article] {
        page_slice(&self.visible, self.pager.current)
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.pager.go_to(page);
    }

    pub fn next_page(&mut self) {
        self.pager.next();
    }

    pub fn previous_page(&mut self) {
        self.pager.previous();
    }
}

#[cfg(test)]
mod tests {
    use super::{FeedState, Outcome};
    use crate::article::{Article, LatLngLabel};
    use crate::cache::{ArticleCache, CacheLookup, InMemoryStore};
    use crate::error::{ApiError, DEFAULT_FETCH_ERROR, FeedError};
    use crate::query::{Filters, LabelFilter, SortKey};
    use pretty_assertions::assert_eq;

    const TODAY: &str = "2024-06-01";

    fn list(n: usize) -> Vec<Article> {
        (0..n).map(|i| Article::fixture(&format!("a{i}"))).collect()
    }

    #[test]
    fn cold_load_fetches_and_caches() {
        let mut cache = ArticleCache::new(InMemoryStore::new());
        let mut state = FeedState::new();
        let plan = state.refresh(&cache, TODAY, false);
        assert!(!plan.served_from_cache);
        assert!(state.is_loading());

        let outcome = state.complete_refresh(plan.token, Ok(list(3)), &mut cache, TODAY);
        assert_eq!(outcome, Outcome::Applied);
        assert!(!state.is_loading());
        assert_eq!(state.articles().len(), 3);
        assert!(matches!(cache.lookup(TODAY), CacheLookup::Fresh(v) if v.len() == 3));
    }

    #[test]
    fn warm_load_serves_cache_then_refreshes() {
        let mut cache = ArticleCache::new(InMemoryStore::new());
        cache.save(TODAY, &list(2)).unwrap();

        let mut state = FeedState::new();
        let plan = state.refresh(&cache, TODAY, false);
        assert!(plan.served_from_cache);
        assert!(!state.is_loading());
        assert_eq!(state.articles().len(), 2);

        state.complete_refresh(plan.token, Ok(list(5)), &mut cache, TODAY);
        assert_eq!(state.articles().len(), 5);
    }

    #[test]
    fn force_skips_cache() {
        let mut cache = ArticleCache::new(InMemoryStore::new());
        cache.save(TODAY, &list(2)).unwrap();
        let mut state = FeedState::new();
        let plan = state.refresh(&cache, TODAY, true);
        assert!(!plan.served_from_cache);
        assert!(state.articles().is_empty());
    }

    #[test]
    fn failed_cold_load_sets_error() {
        let mut cache = ArticleCache::new(InMemoryStore::new());
        let mut state = FeedState::new();
        let plan = state.refresh(&cache, TODAY, false);
        let err = FeedError::from(ApiError::Status(500));
        assert_eq!(
            state.complete_refresh(plan.token, Err(err), &mut cache, TODAY),
            Outcome::Failed
        );
        assert_eq!(state.error(), Some(DEFAULT_FETCH_ERROR));
        assert!(!state.is_loading());
    }

    #[test]
    fn failed_background_refresh_keeps_cached_list() {
        let mut cache = ArticleCache::new(InMemoryStore::new());
        cache.save(TODAY, &list(2)).unwrap();
        let mut state = FeedState::new();
        let plan = state.refresh(&cache, TODAY, false);
        let err = FeedError::from(ApiError::Status(500));
        state.complete_refresh(plan.token, Err(err), &mut cache, TODAY);
        assert_eq!(state.error(), None);
        assert_eq!(state.articles().len(), 2);
    }

    #[test]
    fn stale_response_is_dropped() {
        let mut state = FeedState::new();
        let first = state.begin_request();
        let second = state.begin_request();

        assert_eq!(state.complete_search(second, Ok(list(1))), Outcome::Applied);
        assert_eq!(state.complete_search(first, Ok(list(7))), Outcome::Stale);
        assert_eq!(state.articles().len(), 1);
    }

    #[test]
    fn search_and_filters_reset_to_first_page() {
        let mut state = FeedState::new();
        state.replace_articles(list(35));
        state.go_to_page(3);
        assert_eq!(state.current_page()[0].uri, "a20");

        let token = state.begin_request();
        state.complete_search(token, Ok(list(12)));
        assert_eq!(state.pager().current, 1);
        assert_eq!(state.pager().total, 2);

        state.next_page();
        assert_eq!(state.current_page().len(), 2);
        state.set_filters(Filters::default());
        assert_eq!(state.pager().current, 1);
    }

    #[test]
    fn filter_then_sort_drives_visible() {
        let mut articles = list(3);
        for (i, a) in articles.iter_mut().enumerate() {
            a.sentiment = i as f64 / 10.0;
            a.locations.push(LatLngLabel {
                label: if i == 1 { "Lima".into() } else { "Quito".into() },
                latitude: 1.0,
                longitude: 1.0,
            });
        }
        let mut state = FeedState::new();
        state.replace_articles(articles);
        let rev = state.revision();

        state.set_sort(SortKey::Sentiment);
        assert_eq!(state.visible()[0].uri, "a2");
        assert!(state.revision() > rev);

        let rev = state.revision();
        state.set_sort(SortKey::None);
        assert_eq!(state.revision(), rev);

        state.set_filters(Filters {
            location: LabelFilter::parse("Quito"),
            concept: LabelFilter::Any,
        });
        let uris: Vec<&str> = state.visible().iter().map(|a| a.uri.as_str()).collect();
        assert_eq!(uris, vec!["a2", "a0"]);
        assert_eq!(state.available_locations(), vec!["Quito", "Lima"]);
    }
}
