use std::{
    collections::{HashMap, VecDeque},
    time::Duration,
};

use async_trait::async_trait;
use campus_pagination::{
    collection::Collection,
    config::LoaderConfig,
    fetch_error::FetchError,
    list_loader::ListQuery,
    page_fetcher::{ListScope, PageFetcher},
    page_request::{Filters, PageRequest},
    page_response::{PageResponse, total_pages_for},
    request_pacer::PacingPolicy,
};
use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct FetchCall {
    pub page: u32,
    pub filters: Filters,
    pub at: Instant,
}

enum Outcome {
    Serve,
    Items(Vec<String>),
    Fail(FetchError),
}

struct Scripted {
    delay: Duration,
    outcome: Outcome,
}

/// In-memory collection of `total` items named `<label>-<index>`, where the
/// label is the `status` filter (or `item`). Individual calls per page can be
/// scripted to fail, be delayed or return fixed items.
pub struct ScriptedFetcher {
    total: usize,
    script: Mutex<HashMap<u32, VecDeque<Scripted>>>,
    calls: Mutex<Vec<FetchCall>>,
}

impl ScriptedFetcher {
    pub fn new(total: usize) -> Self {
        ScriptedFetcher {
            total,
            script: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn push(self, page: u32, scripted: Scripted) -> Self {
        self.script
            .lock()
            .entry(page)
            .or_default()
            .push_back(scripted);
        self
    }

    pub fn fail_page(self, page: u32, error: FetchError) -> Self {
        self.push(
            page,
            Scripted {
                delay: Duration::ZERO,
                outcome: Outcome::Fail(error),
            },
        )
    }

    pub fn delay_page(self, page: u32, delay: Duration) -> Self {
        self.push(
            page,
            Scripted {
                delay,
                outcome: Outcome::Serve,
            },
        )
    }

    pub fn serve_items(self, page: u32, delay: Duration, items: &[&str]) -> Self {
        self.push(
            page,
            Scripted {
                delay,
                outcome: Outcome::Items(items.iter().map(|item| item.to_string()).collect()),
            },
        )
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().clone()
    }

    pub fn called_pages(&self) -> Vec<u32> {
        self.calls.lock().iter().map(|call| call.page).collect()
    }

    pub fn expected_page(&self, request: &PageRequest) -> Vec<String> {
        let label = request
            .filters()
            .get("status")
            .cloned()
            .unwrap_or_else(|| "item".to_string());

        let limit = request.limit() as usize;
        let start = ((request.page() as usize - 1) * limit).min(self.total);
        let end = (start + limit).min(self.total);

        (start..end).map(|index| format!("{label}-{index}")).collect()
    }
}

#[async_trait]
impl PageFetcher<String> for ScriptedFetcher {
    async fn fetch_page(
        &self,
        _scope: &ListScope,
        request: &PageRequest,
    ) -> Result<PageResponse<String>, FetchError> {
        let scripted = self
            .script
            .lock()
            .get_mut(&request.page())
            .and_then(|queue| queue.pop_front());

        self.calls.lock().push(FetchCall {
            page: request.page(),
            filters: request.filters().clone(),
            at: Instant::now(),
        });

        let Scripted { delay, outcome } = scripted.unwrap_or(Scripted {
            delay: Duration::ZERO,
            outcome: Outcome::Serve,
        });

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let total = self.total as u64;
        let total_pages = total_pages_for(total, request.limit());

        match outcome {
            Outcome::Serve => Ok(PageResponse::new(
                self.expected_page(request),
                total,
                total_pages,
            )),
            Outcome::Items(items) => Ok(PageResponse::new(items, total, total_pages)),
            Outcome::Fail(error) => Err(error),
        }
    }
}

pub fn loader_config(limit: u32) -> LoaderConfig {
    LoaderConfig {
        limit,
        max_prefetch_pages: 3,
        pacing: PacingPolicy::FixedDelay {
            delay: Duration::from_millis(100),
        },
        rate_limit_retries: 1,
    }
}

pub fn classes_query() -> ListQuery {
    ListQuery::new(ListScope::new(Collection::Classes))
}
