use std::{num::NonZeroU32, str::FromStr, time::Duration};

use thiserror::Error;

use crate::{
    page_request::DEFAULT_PAGE_LIMIT,
    request_pacer::{DEFAULT_PREFETCH_DELAY, PacingPolicy},
};

pub const API_URL_ENV_VARS: [&str; 2] = ["CAMPUS_API_URL", "API_BASE_URL"];
pub const API_TOKEN_ENV_VAR: &str = "CAMPUS_API_TOKEN";
pub const PAGE_LIMIT_ENV_VAR: &str = "CAMPUS_PAGE_LIMIT";
pub const MAX_PREFETCH_PAGES_ENV_VAR: &str = "CAMPUS_MAX_PREFETCH_PAGES";
pub const PREFETCH_DELAY_MS_ENV_VAR: &str = "CAMPUS_PREFETCH_DELAY_MS";
pub const REQUEST_TIMEOUT_SECS_ENV_VAR: &str = "CAMPUS_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_MAX_PREFETCH_PAGES: u32 = 3;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RATE_LIMIT_RETRIES: u32 = 1;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing API base URL (set {})", API_URL_ENV_VARS.join(" or "))]
    MissingBaseUrl,

    #[error("Invalid API base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Connection settings for the REST backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            api_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let base_url = API_URL_ENV_VARS
            .iter()
            .filter_map(|name| lookup(*name))
            .find(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingBaseUrl)?;

        let request_timeout = parse_var(&lookup, REQUEST_TIMEOUT_SECS_ENV_VAR)?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Ok(ClientConfig {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            api_token: lookup(API_TOKEN_ENV_VAR).filter(|token| !token.trim().is_empty()),
            request_timeout,
        })
    }
}

/// Page size, prefetch cap and pacing. The prefetch cap and the pacing
/// policy are independent knobs.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub limit: u32,
    pub max_prefetch_pages: u32,
    pub pacing: PacingPolicy,
    /// How many times a 429 carrying `Retry-After` is retried per page.
    pub rate_limit_retries: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            limit: DEFAULT_PAGE_LIMIT,
            max_prefetch_pages: DEFAULT_MAX_PREFETCH_PAGES,
            pacing: PacingPolicy::default(),
            rate_limit_retries: DEFAULT_RATE_LIMIT_RETRIES,
        }
    }
}

impl LoaderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = LoaderConfig::default();

        let limit = parse_var::<NonZeroU32, _>(&lookup, PAGE_LIMIT_ENV_VAR)?
            .map(NonZeroU32::get)
            .unwrap_or(defaults.limit);

        let max_prefetch_pages = parse_var::<NonZeroU32, _>(&lookup, MAX_PREFETCH_PAGES_ENV_VAR)?
            .map(NonZeroU32::get)
            .unwrap_or(defaults.max_prefetch_pages);

        let delay = parse_var::<u64, _>(&lookup, PREFETCH_DELAY_MS_ENV_VAR)?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PREFETCH_DELAY);

        Ok(LoaderConfig {
            limit,
            max_prefetch_pages,
            pacing: PacingPolicy::FixedDelay { delay },
            rate_limit_retries: defaults.rate_limit_retries,
        })
    }
}

fn parse_var<V, L>(lookup: &L, name: &'static str) -> Result<Option<V>, ConfigError>
where
    V: FromStr,
    L: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}
