//! Pure retry policy for weather requests.
//!
//! Attempt numbers are 1-based: `decide(1, ..)` is asked after the first
//! request failed.

use super::types::FetchFailure;
use crate::config::WeatherConfig;
use std::time::Duration;

/// Server-side statuses worth another try after a short backoff
pub const RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];
/// Rate-limit statuses; retried only after the long backoff
pub const RATE_LIMIT_STATUSES: [u16; 2] = [429, 443];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    GiveUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub rate_limit_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
            rate_limit_backoff: Duration::from_secs(30 * 60),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &WeatherConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            rate_limit_backoff: Duration::from_secs(config.rate_limit_backoff_seconds),
        }
    }

    /// Exponential backoff before attempt `attempt + 1`
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(factor)
    }

    pub fn decide(&self, attempt: u32, failure: &FetchFailure) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        match failure {
            FetchFailure::Status(code) if RATE_LIMIT_STATUSES.contains(code) => {
                RetryDecision::RetryAfter(self.rate_limit_backoff)
            }
            FetchFailure::Status(code) if RETRY_STATUSES.contains(code) => {
                RetryDecision::RetryAfter(self.backoff_for(attempt))
            }
            FetchFailure::Timeout | FetchFailure::Connect(_) => {
                RetryDecision::RetryAfter(self.backoff_for(attempt))
            }
            FetchFailure::Status(_) | FetchFailure::Decode(_) => RetryDecision::GiveUp,
        }
    }
}
