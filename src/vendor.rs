//! Enphase Enlighten v2 system summary client

use crate::config::VendorConfig;
use crate::error::{Result, SolstatError};
use crate::logging::get_logger;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;

/// Fields the monitor needs from the vendor summary
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VendorSummary {
    /// Epoch seconds of the array's latest report
    pub last_report_at: i64,
    pub status: String,
    /// Wh produced today; integer or float on the wire
    pub energy_today: f64,
}

/// Decode a `/systems/{id}/summary` body; unknown fields are ignored
pub fn parse_summary_body(body: &str) -> Result<VendorSummary> {
    let summary: VendorSummary = serde_json::from_str(body)?;
    Ok(summary)
}

#[async_trait::async_trait]
pub trait VendorApi: Send + Sync {
    async fn fetch_summary(&self) -> Result<VendorSummary>;
}

pub struct EnphaseClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    user_id: String,
    logger: crate::logging::StructuredLogger,
}

impl EnphaseClient {
    pub fn new(config: &VendorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        Ok(Self {
            http,
            url: format!(
                "{}/systems/{}/summary",
                config.base_url.trim_end_matches('/'),
                config.system_id.trim()
            ),
            api_key: config.api_key.trim().to_string(),
            user_id: config.user_id.trim().to_string(),
            logger: get_logger("vendor"),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl VendorApi for EnphaseClient {
    async fn fetch_summary(&self) -> Result<VendorSummary> {
        let resp = self
            .http
            .get(&self.url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("user_id", self.user_id.as_str()),
            ])
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, concat!("solstat/", env!("CARGO_PKG_VERSION")))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            self.logger
                .error(&format!("Vendor API error: {}", status.as_u16()));
            return Err(SolstatError::api(format!(
                "Vendor API returned {}",
                status.as_u16()
            )));
        }
        let body = resp.text().await?;
        parse_summary_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_summary() {
        let body = r#"{
            "system_id": 67,
            "current_power": 3322,
            "energy_lifetime": 19050353,
            "energy_today": 25190,
            "last_report_at": 1699999000,
            "modules": 35,
            "status": "normal",
            "summary_date": "2023-11-14"
        }"#;
        let s = parse_summary_body(body).unwrap();
        assert_eq!(s.last_report_at, 1_699_999_000);
        assert_eq!(s.status, "normal");
        assert_eq!(s.energy_today, 25_190.0);
    }

    #[test]
    fn float_energy_accepted() {
        let s = parse_summary_body(
            r#"{"last_report_at": 5, "status": "comm", "energy_today": 12.5}"#,
        )
        .unwrap();
        assert_eq!(s.energy_today, 12.5);
    }

    #[test]
    fn missing_field_is_error() {
        let err = parse_summary_body(r#"{"status": "normal", "energy_today": 1}"#).unwrap_err();
        assert!(matches!(err, SolstatError::Serialization { .. }));
    }

    #[test]
    fn url_is_built_from_config() {
        let cfg = VendorConfig {
            base_url: "https://api.enphaseenergy.com/api/v2/".to_string(),
            system_id: "67".to_string(),
            ..VendorConfig::default()
        };
        let client = EnphaseClient::new(&cfg).unwrap();
        assert_eq!(
            client.url(),
            "https://api.enphaseenergy.com/api/v2/systems/67/summary"
        );
    }
}
