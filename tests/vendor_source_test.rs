mod common;

use common::{ScriptedVendor, serve_responses, summary};
use solstat::config::VendorConfig;
use solstat::source::{StatusSource, VendorSource};
use solstat::store::{RecordStore, SqliteStore};
use solstat::vendor::{EnphaseClient, VendorApi};
use std::sync::Arc;

#[tokio::test]
async fn enphase_client_hits_summary_endpoint() {
    let body = r#"{"current_power":3322,"energy_today":25190,"last_report_at":1699999000,"status":"normal","system_id":67}"#;
    let (base, server) = serve_responses(vec![(200, body.to_string())]).await;
    let client = EnphaseClient::new(&VendorConfig {
        base_url: format!("{}/api/v2", base),
        api_key: "key1".to_string(),
        user_id: "user1".to_string(),
        system_id: "67".to_string(),
        request_timeout_ms: 2_000,
    })
    .unwrap();

    let s = client.fetch_summary().await.unwrap();
    assert_eq!(s.last_report_at, 1_699_999_000);
    assert_eq!(s.energy_today, 25_190.0);

    let seen = server.await.unwrap();
    assert!(seen[0].starts_with("GET /api/v2/systems/67/summary?key=key1&user_id=user1 "));
}

#[tokio::test]
async fn enphase_error_status_is_api_error() {
    let (base, server) = serve_responses(vec![(500, "{}".to_string())]).await;
    let client = EnphaseClient::new(&VendorConfig {
        base_url: base,
        system_id: "67".to_string(),
        ..VendorConfig::default()
    })
    .unwrap();
    let err = client.fetch_summary().await.unwrap_err();
    assert!(!err.is_fatal());
    server.await.unwrap();
}

#[tokio::test]
async fn each_fetch_appends_one_record() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let vendor = Arc::new(ScriptedVendor::new([
        summary(1_699_990_000, "normal", 100.0),
        summary(1_699_995_000, "power", 150.0),
    ]));
    let source = VendorSource::new(vendor, store.clone());

    let first = source.fetch_latest().await.unwrap();
    assert!(first.sample.unwrap().is_reporting);
    let second = source.fetch_latest().await.unwrap();
    assert!(!second.sample.unwrap().is_reporting);
    assert!(second.connected);

    assert_eq!(store.estimated_count().unwrap(), 2);
    let latest = store.latest().unwrap().unwrap();
    assert_eq!(latest.epoch_last_report, 1_699_995_000);
    assert_eq!(latest.status, "power");
    assert!(!latest.reporting);

    // Queue drained: the vendor is down, nothing new is written
    let third = source.fetch_latest().await.unwrap();
    assert!(third.sample.is_none());
    assert_eq!(store.estimated_count().unwrap(), 2);
}
