use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    fetch_error::FetchError,
    page_cache::PageCache,
    page_fetcher::{ListScope, PageFetcher},
    page_request::PageRequest,
    page_response::PageResponse,
    request_pacer::{PacingPolicy, RequestPacer},
};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PrefetchReport {
    pub loaded_pages: Vec<u32>,
    #[serde(skip)]
    pub failed_pages: Vec<(u32, FetchError)>,
    pub total: u64,
    pub total_pages: u32,
    /// First fetched page that came back shorter than the limit.
    pub last_page: Option<u32>,
}

/// Eagerly loads the first pages of a collection, one request at a time.
pub struct BoundedPrefetcher {
    max_pages: u32,
    pacer: RequestPacer,
    rate_limit_retries: u32,
}

impl BoundedPrefetcher {
    pub fn new(max_pages: u32, pacing: PacingPolicy, rate_limit_retries: u32) -> Self {
        BoundedPrefetcher {
            max_pages: max_pages.max(1),
            pacer: RequestPacer::new(pacing),
            rate_limit_retries,
        }
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn rate_limit_retries(&self) -> u32 {
        self.rate_limit_retries
    }

    /// Clears `cache`, then loads page 1 and up to `max_pages - 1` following
    /// pages. Only a page 1 failure (or cancellation) is returned as an error;
    /// later failures are logged and listed in the report.
    pub async fn run<T, F>(
        &self,
        fetcher: &F,
        scope: &ListScope,
        template: &PageRequest,
        cache: &Mutex<PageCache<T>>,
        cancel: &CancellationToken,
    ) -> Result<PrefetchReport, FetchError>
    where
        T: Send,
        F: PageFetcher<T> + ?Sized,
    {
        cache.lock().clear();

        let limit = template.limit();
        let first_request = template.for_page(1);

        self.paced(0, cancel).await?;
        let ticket = cache.lock().issue_ticket(1);

        let first = fetch_page_cancellable(
            fetcher,
            scope,
            &first_request,
            cancel,
            self.rate_limit_retries,
        )
        .await?;

        let mut report = PrefetchReport {
            loaded_pages: vec![1],
            failed_pages: Vec::new(),
            total: first.total(),
            total_pages: first.total_pages(),
            last_page: first.is_last_page(limit).then_some(1),
        };

        cache.lock().apply(ticket, first.into_items());

        let pages_to_fetch = report.total_pages.min(self.max_pages);

        for page in 2..=pages_to_fetch {
            if report.last_page.is_some() {
                break;
            }

            self.paced((page - 1) as usize, cancel).await?;
            let ticket = cache.lock().issue_ticket(page);
            let request = template.for_page(page);

            match fetch_page_cancellable(fetcher, scope, &request, cancel, self.rate_limit_retries)
                .await
            {
                Ok(response) => {
                    if response.is_last_page(limit) {
                        report.last_page = Some(page);
                    }
                    cache.lock().apply(ticket, response.into_items());
                    report.loaded_pages.push(page);
                }
                Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
                Err(err) => {
                    warn!(
                        "Prefetch of {} page {} failed, continuing: {}",
                        scope.collection, page, err
                    );
                    report.failed_pages.push((page, err));
                }
            }
        }

        debug!(
            "Prefetched {} pages of {} ({} failed)",
            report.loaded_pages.len(),
            scope.collection,
            report.failed_pages.len()
        );

        Ok(report)
    }

    // Waits for the pacer unless `cancel` fires first; cancellation wins ties.
    async fn paced(&self, index: usize, cancel: &CancellationToken) -> Result<(), FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            _ = self.pacer.before_request(index) => Ok(()),
        }
    }
}

/// One fetch raced against `cancel`. A 429 that carries `Retry-After` is
/// retried after the advertised delay, at most `rate_limit_retries` times.
pub async fn fetch_page_cancellable<T, F>(
    fetcher: &F,
    scope: &ListScope,
    request: &PageRequest,
    cancel: &CancellationToken,
    rate_limit_retries: u32,
) -> Result<PageResponse<T>, FetchError>
where
    T: Send,
    F: PageFetcher<T> + ?Sized,
{
    let mut attempt = 0;

    loop {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = fetcher.fetch_page(scope, request) => result,
        };

        match result {
            Err(err) if err.is_rate_limited() && attempt < rate_limit_retries => {
                let Some(delay) = err.retry_after() else {
                    return Err(err);
                };

                attempt += 1;
                debug!(
                    "Rate limited on {} page {}, retrying in {:?} ({}/{})",
                    scope.collection,
                    request.page(),
                    delay,
                    attempt,
                    rate_limit_retries
                );

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            result => return result,
        }
    }
}
