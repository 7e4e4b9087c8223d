use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{
    Method, RequestBuilder, Response, Url,
    header::{ACCEPT, HeaderMap, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    config::{ClientConfig, ConfigError},
    fetch_error::FetchError,
    page_fetcher::{ListScope, PageFetcher},
    page_request::PageRequest,
    page_response::{PageResponse, parse_error_message, parse_list_response},
    status_dispatcher::{StatusSender, StatusUpdate},
};

pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Thin wrapper over `reqwest` that applies auth, managed-context headers and
/// request ids, and maps failures onto [`FetchError`].
pub struct ApiClient {
    config: ClientConfig,
    base_url: Url,
    client: reqwest::Client,
    request_counter: AtomicU64,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason,
        };

        let base_url = Url::parse(&config.base_url).map_err(|err| invalid(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("not a hierarchical URL".to_string()));
        }

        Ok(Self {
            config,
            base_url,
            client: reqwest::Client::new(),
            request_counter: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Appends `segments` to the base URL, percent-encoding each one so a
    /// value containing `/`, `?` or `#` stays a single segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn next_request_id(&self) -> String {
        let counter = self.request_counter.fetch_add(1, Ordering::Relaxed);
        format!(
            "req_{}_{}",
            jiff::Timestamp::now().as_millisecond(),
            counter
        )
    }

    fn request(&self, method: Method, segments: &[&str], scope: &ListScope) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, self.url(segments))
            .timeout(self.config.request_timeout)
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, self.next_request_id());

        if let Some(token) = &self.config.api_token {
            builder = builder.bearer_auth(token);
        }

        for (name, value) in scope.context.headers() {
            builder = builder.header(name, value);
        }

        builder
    }

    async fn error_from_response(response: Response) -> FetchError {
        let status = response.status().as_u16();
        let retry_after = parse_retry_after(response.headers(), jiff::Timestamp::now());
        let body = response.bytes().await.unwrap_or_default();

        let message = parse_error_message(&body)
            .unwrap_or_else(|| String::from_utf8_lossy(&body).trim().to_string());

        FetchError::Server {
            status,
            message,
            retry_after,
        }
    }
}

#[async_trait]
impl<T> PageFetcher<T> for ApiClient
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(
        &self,
        scope: &ListScope,
        request: &PageRequest,
    ) -> Result<PageResponse<T>, FetchError> {
        debug!(
            "ApiClient: GET {} page {} (limit {})",
            scope.collection,
            request.page(),
            request.limit()
        );

        let response = self
            .request(Method::GET, &[scope.collection.segment()], scope)
            .query(&request.query_pairs())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body = response.bytes().await?;
        parse_list_response(&body, request.limit())
    }
}

#[async_trait]
impl StatusSender for ApiClient {
    async fn send_status(
        &self,
        scope: &ListScope,
        id: &str,
        update: &StatusUpdate,
    ) -> Result<(), FetchError> {
        debug!("ApiClient: PATCH {} {} status", scope.collection, id);

        let response = self
            .request(Method::PATCH, &[scope.collection.segment(), id, "status"], scope)
            .json(update)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(())
    }
}

/// `Retry-After` as either delay-seconds or an HTTP date relative to `now`.
pub fn parse_retry_after(headers: &HeaderMap, now: jiff::Timestamp) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = jiff::fmt::rfc2822::parse(value).ok()?;
    let delay = date.timestamp().duration_since(now);

    if delay.is_positive() {
        Some(delay.unsigned_abs())
    } else {
        Some(Duration::ZERO)
    }
}
