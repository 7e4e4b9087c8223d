use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::LoaderConfig,
    fetch_error::FetchError,
    page_cache::PageCache,
    page_fetcher::{ListScope, PageFetcher},
    page_request::{Filters, PageRequest, PageRequestBuilder},
    pagination_controller::{PaginationController, PaginationState},
    prefetcher::{BoundedPrefetcher, PrefetchReport, fetch_page_cancellable},
};

/// Everything that identifies a list: changing any part rebuilds the cache.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListQuery {
    pub scope: ListScope,
    #[serde(default)]
    pub filters: Filters,
}

impl ListQuery {
    pub fn new(scope: ListScope) -> Self {
        ListQuery {
            scope,
            filters: Filters::new(),
        }
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }
}

struct ViewState {
    controller: PaginationController,
    query: Option<ListQuery>,
    error: Option<String>,
    cancel: CancellationToken,
    // Bumped on every load so late results of a replaced query are ignored.
    generation: u64,
}

/// Per-screen paginated list: prefetches the first pages of a query, serves
/// navigation from the cache when it can and fetches single pages otherwise.
///
/// Every method takes `&self`, so several navigations may be in flight at
/// once. Responses for a page are applied only if no newer request for that
/// page was issued in the meantime.
pub struct ListLoader<T, F> {
    fetcher: F,
    prefetcher: BoundedPrefetcher,
    limit: u32,
    cache: Mutex<PageCache<T>>,
    view: Mutex<ViewState>,
}

impl<T, F> ListLoader<T, F>
where
    T: Clone + Send,
    F: PageFetcher<T>,
{
    pub fn new(fetcher: F, config: LoaderConfig) -> Self {
        let limit = config.limit.max(1);

        ListLoader {
            fetcher,
            prefetcher: BoundedPrefetcher::new(
                config.max_prefetch_pages,
                config.pacing,
                config.rate_limit_retries,
            ),
            limit,
            cache: Mutex::new(PageCache::new(limit)),
            view: Mutex::new(ViewState {
                controller: PaginationController::new(),
                query: None,
                error: None,
                cancel: CancellationToken::new(),
                generation: 0,
            }),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn template(&self, query: &ListQuery) -> PageRequest {
        PageRequestBuilder::default()
            .with_limit(self.limit)
            .with_filters(query.filters.clone())
            .build()
    }

    /// Switches to `query`: cancels in-flight work, resets to page 1, clears
    /// the cache and prefetches.
    pub async fn load(&self, query: ListQuery) -> Result<PrefetchReport, FetchError> {
        let (cancel, generation) = {
            let mut view = self.view.lock();
            view.cancel.cancel();
            view.cancel = CancellationToken::new();
            view.generation += 1;
            view.controller.reset();
            view.query = Some(query.clone());
            view.error = None;
            (view.cancel.clone(), view.generation)
        };

        let result = self
            .prefetcher
            .run(
                &self.fetcher,
                &query.scope,
                &self.template(&query),
                &self.cache,
                &cancel,
            )
            .await;

        let mut view = self.view.lock();
        if view.generation != generation {
            debug!("Load of {} superseded by a newer query", query.scope.collection);
            return result;
        }

        match &result {
            Ok(report) => {
                view.controller.update(1, report.total_pages, report.last_page == Some(1));
                if let Some(last_page) = report.last_page {
                    view.controller.update(last_page, report.total_pages, true);
                }
                view.error = None;
                info!(
                    "Loaded {}: {} items over {} pages",
                    query.scope.collection, report.total, report.total_pages
                );
            }
            Err(FetchError::Cancelled) => {}
            Err(err) => {
                view.error = Some(err.user_message());
            }
        }

        result
    }

    /// Re-runs the prefetch for the current query. No-op before the first load.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        let query = self.view.lock().query.clone();

        match query {
            Some(query) => self.load(query).await.map(|_| ()),
            None => Ok(()),
        }
    }

    /// Moves to `page` if it is within bounds, fetching it unless cached.
    /// Returns `Ok(false)` when the move was rejected.
    pub async fn go_to_page(&self, page: u32) -> Result<bool, FetchError> {
        if !self.view.lock().controller.go_to_page(page) {
            return Ok(false);
        }

        if self.cache.lock().contains_page(page) {
            return Ok(true);
        }

        self.fetch_page(page).await.map(|_| true)
    }

    pub async fn next(&self) -> Result<bool, FetchError> {
        let target = {
            let view = self.view.lock();
            if !view.controller.has_next_page() {
                return Ok(false);
            }
            view.controller.current_page() + 1
        };

        self.go_to_page(target).await
    }

    pub async fn prev(&self) -> Result<bool, FetchError> {
        let target = {
            let view = self.view.lock();
            if !view.controller.has_prev_page() {
                return Ok(false);
            }
            view.controller.current_page() - 1
        };

        self.go_to_page(target).await
    }

    /// Fetches the current page again, bypassing the cache.
    pub async fn reload_current_page(&self) -> Result<(), FetchError> {
        let page = self.view.lock().controller.current_page();
        self.fetch_page(page).await
    }

    async fn fetch_page(&self, page: u32) -> Result<(), FetchError> {
        let (query, cancel, generation) = {
            let view = self.view.lock();
            match &view.query {
                Some(query) => (query.clone(), view.cancel.clone(), view.generation),
                None => return Ok(()),
            }
        };

        let ticket = self.cache.lock().issue_ticket(page);
        let request = self.template(&query).for_page(page);

        let result = fetch_page_cancellable(
            &self.fetcher,
            &query.scope,
            &request,
            &cancel,
            self.prefetcher.rate_limit_retries(),
        )
        .await;

        match result {
            Ok(response) => {
                let is_last_page = response.is_last_page(self.limit);
                let total_pages = response.total_pages();

                if !self.cache.lock().apply(ticket, response.into_items()) {
                    warn!(
                        "Discarding stale response for {} page {}",
                        query.scope.collection, page
                    );
                    return Ok(());
                }

                let mut view = self.view.lock();
                if view.generation == generation {
                    view.controller.update(page, total_pages, is_last_page);
                    view.error = None;
                }
                Ok(())
            }
            Err(FetchError::Cancelled) => Err(FetchError::Cancelled),
            Err(err) => {
                let mut view = self.view.lock();
                if view.generation == generation {
                    view.error = Some(err.user_message());
                }
                Err(err)
            }
        }
    }

    /// Items of the current page, in server order.
    pub fn visible_items(&self) -> Vec<T> {
        let page = self.view.lock().controller.current_page();
        self.page_items(page)
    }

    pub fn page_items(&self, page: u32) -> Vec<T> {
        self.cache.lock().slice(page).into_iter().cloned().collect()
    }

    pub fn pagination(&self) -> PaginationState {
        self.view.lock().controller.state()
    }

    pub fn error(&self) -> Option<String> {
        self.view.lock().error.clone()
    }

    pub fn query(&self) -> Option<ListQuery> {
        self.view.lock().query.clone()
    }

    pub fn cached_item_count(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn cached_pages(&self) -> Vec<u32> {
        self.cache.lock().cached_pages()
    }

    /// Cancels every in-flight request. Pending calls resolve with
    /// [`FetchError::Cancelled`] and leave the cache untouched.
    pub fn close(&self) {
        self.view.lock().cancel.cancel();
    }
}
