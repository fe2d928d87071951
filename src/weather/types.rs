use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw facts from one weather API response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// OpenWeatherMap condition id (`weather[0].id`)
    pub condition_code: u16,
    /// Epoch seconds
    pub sunrise: i64,
    /// Epoch seconds
    pub sunset: i64,
}

/// Gate answer for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeatherReport {
    /// Inside the sunrise/sunset window
    pub daylight: bool,
    /// Daylight and clear enough to collect
    pub favorable: bool,
    /// Observation behind the answer; `None` when degraded
    pub observation: Option<WeatherObservation>,
    /// API unavailable; favorable assumed
    pub degraded: bool,
}

impl WeatherReport {
    /// Fallback when the API could not be reached
    pub fn degraded() -> Self {
        Self {
            daylight: true,
            favorable: true,
            observation: None,
            degraded: true,
        }
    }
}

/// Why a single weather request failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("unreadable response: {0}")]
    Decode(String),
}
