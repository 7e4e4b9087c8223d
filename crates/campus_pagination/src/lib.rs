pub mod api_client;
pub mod collection;
pub mod config;
pub mod fetch_error;
pub mod list_loader;
pub mod managed_context;
pub mod page_cache;
pub mod page_fetcher;
pub mod page_request;
pub mod page_response;
pub mod pagination_controller;
pub mod prefetcher;
pub mod request_pacer;
pub mod session;
pub mod status_dispatcher;
