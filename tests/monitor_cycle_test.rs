mod common;

use common::{NOW, ScriptedVendor, ScriptedWeather, clear_sky, sky, summary};
use solstat::config::Config;
use solstat::indicator::{Indicator, IndicatorCommand, LogIndicators};
use solstat::monitor::{HealthState, ManualClock, Monitor, MonitorParts};
use solstat::source::{StoreSource, VendorSource};
use solstat::store::{RecordStore, SqliteStore, StatusRecord};
use std::sync::Arc;

fn config() -> Config {
    let mut cfg = Config::default();
    cfg.weather.api_key = "k".to_string();
    cfg.weather.location = "94040,us".to_string();
    cfg
}

#[tokio::test]
async fn vendor_variant_persists_and_lights_green() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let vendor = Arc::new(ScriptedVendor::new([summary(1_699_999_000, "normal", 25_190.0)]));
    let lamps = LogIndicators::new();
    let mut monitor = Monitor::new(
        config(),
        MonitorParts {
            store: store.clone(),
            weather: Arc::new(ScriptedWeather::always(clear_sky())),
            source: Box::new(VendorSource::new(vendor, store.clone())),
            indicators: Box::new(lamps.clone()),
            clock: Arc::new(ManualClock::new(NOW)),
        },
    )
    .unwrap();

    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.command, IndicatorCommand::GreenOnly);
    assert_eq!(lamps.lit(), vec![Indicator::Blue, Indicator::Green]);
    assert_eq!(store.estimated_count().unwrap(), 1);

    // Vendor gone on the next cycle: amber, nothing appended
    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.verdict, None);
    assert_eq!(report.command, IndicatorCommand::AmberOnly);
    assert_eq!(store.estimated_count().unwrap(), 1);
}

#[tokio::test]
async fn store_variant_follows_day_and_night() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        SqliteStore::open(dir.path().join("s.db"), std::time::Duration::from_secs(1)).unwrap(),
    );
    store
        .insert(&StatusRecord::new(NOW - 90_000, 3.0, "normal", true))
        .unwrap();

    let weather = ScriptedWeather::always(clear_sky()).then(sky(600));
    let lamps = LogIndicators::new();
    let clock = Arc::new(ManualClock::new(NOW));
    let mut monitor = Monitor::new(
        config(),
        MonitorParts {
            store: store.clone(),
            weather: Arc::new(weather),
            source: Box::new(StoreSource::new(store.clone())),
            indicators: Box::new(lamps.clone()),
            clock: clock.clone(),
        },
    )
    .unwrap();

    // Snow: awaiting daylight regardless of the stale record
    let snowy = monitor.run_cycle().await.unwrap();
    assert_eq!(snowy.verdict.unwrap().health, HealthState::AwaitingDaylight);
    assert_eq!(lamps.lit(), vec![Indicator::Blue, Indicator::Amber]);

    // Clear: up but delayed
    clock.advance(1_800);
    let clear = monitor.run_cycle().await.unwrap();
    assert_eq!(clear.command, IndicatorCommand::GreenAmber);
    assert_eq!(
        lamps.lit(),
        vec![Indicator::Blue, Indicator::Green, Indicator::Amber]
    );

    monitor.release();
    assert!(lamps.lit().is_empty());
}
