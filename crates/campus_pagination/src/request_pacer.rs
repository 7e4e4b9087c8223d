use std::{num::NonZeroU32, time::Duration};

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_PREFETCH_DELAY: Duration = Duration::from_millis(100);

/// How consecutive requests of one batch are spaced out.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum PacingPolicy {
    /// Sleep a fixed delay between two requests of the same batch.
    FixedDelay { delay: Duration },
    /// Token bucket shared by every request issued through the pacer.
    TokenBucket {
        per_second: NonZeroU32,
        burst: NonZeroU32,
    },
    Unpaced,
}

impl Default for PacingPolicy {
    fn default() -> Self {
        PacingPolicy::FixedDelay {
            delay: DEFAULT_PREFETCH_DELAY,
        }
    }
}

pub struct RequestPacer {
    policy: PacingPolicy,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl RequestPacer {
    pub fn new(policy: PacingPolicy) -> Self {
        let limiter = match policy {
            PacingPolicy::TokenBucket { per_second, burst } => Some(RateLimiter::direct(
                Quota::per_second(per_second).allow_burst(burst),
            )),
            _ => None,
        };

        RequestPacer { policy, limiter }
    }

    pub fn policy(&self) -> PacingPolicy {
        self.policy
    }

    /// Waits until request number `index` (0-based) of a batch may be sent.
    pub async fn before_request(&self, index: usize) {
        match (&self.policy, &self.limiter) {
            (PacingPolicy::FixedDelay { delay }, _) => {
                if index > 0 && !delay.is_zero() {
                    debug!("RequestPacer: waiting {:?} before request {}", delay, index);
                    tokio::time::sleep(*delay).await;
                }
            }
            (PacingPolicy::TokenBucket { .. }, Some(limiter)) => {
                limiter.until_ready().await;
            }
            _ => {}
        }
    }
}

impl Default for RequestPacer {
    fn default() -> Self {
        RequestPacer::new(PacingPolicy::default())
    }
}
