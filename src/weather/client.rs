use super::WeatherApi;
use super::types::{FetchFailure, WeatherObservation};
use crate::config::WeatherConfig;
use crate::error::Result;
use crate::logging::get_logger;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ConditionBody {
    id: u16,
}

#[derive(Debug, Deserialize)]
struct SunBody {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct WeatherBody {
    weather: Vec<ConditionBody>,
    sys: SunBody,
}

/// Decode an OpenWeatherMap current-weather body
pub fn parse_weather_body(body: &str) -> std::result::Result<WeatherObservation, FetchFailure> {
    let parsed: WeatherBody =
        serde_json::from_str(body).map_err(|e| FetchFailure::Decode(e.to_string()))?;
    let condition = parsed
        .weather
        .first()
        .ok_or_else(|| FetchFailure::Decode("empty weather array".to_string()))?;
    Ok(WeatherObservation {
        condition_code: condition.id,
        sunrise: parsed.sys.sunrise,
        sunset: parsed.sys.sunset,
    })
}

fn classify_transport(err: &reqwest::Error) -> FetchFailure {
    if err.is_timeout() {
        FetchFailure::Timeout
    } else if let Some(status) = err.status() {
        FetchFailure::Status(status.as_u16())
    } else if err.is_decode() || err.is_body() {
        FetchFailure::Decode(err.to_string())
    } else {
        FetchFailure::Connect(err.to_string())
    }
}

/// OpenWeatherMap current-weather client
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    location: String,
    units: String,
    logger: crate::logging::StructuredLogger,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.trim().to_string(),
            location: config.location.trim().to_string(),
            units: config.units.clone(),
            logger: get_logger("weather"),
        })
    }
}

#[async_trait::async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn fetch(&self) -> std::result::Result<WeatherObservation, FetchFailure> {
        let resp = self
            .http
            .get(&self.base_url)
            .query(&[
                ("zip", self.location.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, concat!("solstat/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = resp.status();
        if !status.is_success() {
            self.logger
                .debug(&format!("Weather API answered {}", status.as_u16()));
            return Err(FetchFailure::Status(status.as_u16()));
        }
        let body = resp.text().await.map_err(|e| classify_transport(&e))?;
        parse_weather_body(&body)
    }
}
