use std::time::Duration;

use thiserror::Error;

pub const TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// No response was received: connection refused, DNS failure, timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("Server error: {status} - {message}")]
    Server {
        status: u16,
        message: String,
        retry_after: Option<Duration>,
    },

    /// A 2xx response whose body is not a usable list envelope.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A 2xx response flagged `success: false`, with the backend's message.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        FetchError::Server {
            status,
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::Server { status, .. } if *status == TOO_MANY_REQUESTS)
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            FetchError::Server { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// True for every 2xx response that could not be used as a list page.
    pub fn is_malformed(&self) -> bool {
        matches!(self, FetchError::MalformedResponse(_) | FetchError::Rejected(_))
    }

    /// The string a screen shows in its error banner.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Network(_) => "Network error. Please check your connection.".to_string(),
            FetchError::Server { status, message, .. } => {
                if message.trim().is_empty() {
                    format!("Request failed with status {status}. Please try again.")
                } else {
                    message.clone()
                }
            }
            FetchError::Rejected(message) if !message.trim().is_empty() => message.clone(),
            FetchError::MalformedResponse(_) | FetchError::Rejected(_) => {
                "Unexpected response from the server. Please try again.".to_string()
            }
            FetchError::Cancelled => "Request cancelled.".to_string(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            return FetchError::MalformedResponse(error.to_string());
        }

        match error.status() {
            Some(status) => FetchError::server(status.as_u16(), error.to_string()),
            None => FetchError::Network(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        FetchError::MalformedResponse(error.to_string())
    }
}
