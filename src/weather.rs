//! Daylight and weather gate
//!
//! Answers one question per cycle: should the array be producing right now?
//! The fetch goes through [`WeatherApi`], the backoff decision through the
//! pure [`RetryPolicy`], and every wait through the injected [`Clock`].

pub mod client;
pub mod retry;
pub mod types;

pub use client::{OpenWeatherClient, parse_weather_body};
pub use retry::{RetryDecision, RetryPolicy};
pub use types::{FetchFailure, WeatherObservation, WeatherReport};

use crate::error::{Result, SolstatError};
use crate::logging::get_logger;
use crate::monitor::Clock;
use std::sync::Arc;

/// Lowest condition code counted as clear sky
pub const FAVORABLE_CODE_MIN: u16 = 800;
/// Overcast; first code no longer counted as favorable
pub const FAVORABLE_CODE_END: u16 = 804;

/// One request against the weather provider, no retries
#[async_trait::async_trait]
pub trait WeatherApi: Send + Sync {
    async fn fetch(&self) -> std::result::Result<WeatherObservation, FetchFailure>;
}

/// Daylight and sky classification for `now`
pub fn classify_conditions(obs: &WeatherObservation, now: i64) -> (bool, bool) {
    let daylight = obs.sunrise <= now && now < obs.sunset;
    let clear = (FAVORABLE_CODE_MIN..FAVORABLE_CODE_END).contains(&obs.condition_code);
    (daylight, daylight && clear)
}

/// Statuses that mean the deployment itself is wrong
fn fatal_status(code: u16) -> Option<SolstatError> {
    match code {
        401 => Some(SolstatError::auth("Invalid API key")),
        404 => Some(SolstatError::config("Invalid weather location")),
        _ => None,
    }
}

pub struct WeatherGate {
    api: Arc<dyn WeatherApi>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    logger: crate::logging::StructuredLogger,
}

impl WeatherGate {
    pub fn new(api: Arc<dyn WeatherApi>, policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            api,
            policy,
            clock,
            logger: get_logger("weather"),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch and classify, retrying transient failures.
    ///
    /// Errors only for invalid credentials or location; exhausted retries
    /// yield [`WeatherReport::degraded`].
    pub async fn evaluate(&self) -> Result<WeatherReport> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let failure = match self.api.fetch().await {
                Ok(obs) => {
                    let (daylight, favorable) = classify_conditions(&obs, self.clock.now_epoch());
                    self.logger.info(&format!(
                        "Weather code {}, daylight: {}, favorable: {}",
                        obs.condition_code, daylight, favorable
                    ));
                    return Ok(WeatherReport {
                        daylight,
                        favorable,
                        observation: Some(obs),
                        degraded: false,
                    });
                }
                Err(f) => f,
            };

            if let FetchFailure::Status(code) = failure {
                if let Some(err) = fatal_status(code) {
                    self.logger.error(&format!("Weather API rejected request: {}", err));
                    return Err(err);
                }
            }

            match self.policy.decide(attempt, &failure) {
                RetryDecision::RetryAfter(delay) => {
                    self.logger.warn(&format!(
                        "Weather attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, self.policy.max_attempts, failure, delay
                    ));
                    self.clock.sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    self.logger.warn(&format!(
                        "Weather unavailable after {} attempt(s) ({}), assuming favorable",
                        attempt, failure
                    ));
                    return Ok(WeatherReport::degraded());
                }
            }
        }
    }
}
