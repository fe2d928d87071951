mod common;

use common::{NOW, ScriptedWeather, clear_sky, sky};
use solstat::SolstatError;
use solstat::monitor::{Clock, ManualClock};
use solstat::weather::{FetchFailure, RetryPolicy, WeatherGate};
use std::sync::Arc;
use std::time::Duration;

fn gate(weather: Arc<ScriptedWeather>, clock: Arc<ManualClock>) -> WeatherGate {
    WeatherGate::new(weather, RetryPolicy::default(), clock)
}

#[tokio::test]
async fn clear_day_is_favorable() {
    let clock = Arc::new(ManualClock::new(NOW));
    let report = gate(Arc::new(ScriptedWeather::always(clear_sky())), clock.clone())
        .evaluate()
        .await
        .unwrap();
    assert!(report.daylight);
    assert!(report.favorable);
    assert!(!report.degraded);
    assert_eq!(report.observation.unwrap().condition_code, 800);
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn overcast_is_daylight_but_unfavorable() {
    let clock = Arc::new(ManualClock::new(NOW));
    let report = gate(Arc::new(ScriptedWeather::always(sky(804))), clock)
        .evaluate()
        .await
        .unwrap();
    assert!(report.daylight);
    assert!(!report.favorable);
}

#[tokio::test]
async fn rate_limit_waits_then_recovers() {
    let weather = Arc::new(ScriptedWeather::always(clear_sky()).then(Err(FetchFailure::Status(429))));
    let clock = Arc::new(ManualClock::new(NOW - 1_800));
    let report = gate(weather.clone(), clock.clone()).evaluate().await.unwrap();

    assert!(report.favorable);
    assert_eq!(weather.calls(), 2);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(1_800)]);
    assert_eq!(clock.now_epoch(), NOW);
}

#[tokio::test]
async fn retries_are_bounded() {
    let weather = Arc::new(ScriptedWeather::always(Err(FetchFailure::Connect(
        "refused".to_string(),
    ))));
    let clock = Arc::new(ManualClock::new(NOW));
    let report = gate(weather.clone(), clock.clone()).evaluate().await.unwrap();

    assert!(report.degraded);
    assert!(report.daylight && report.favorable);
    assert_eq!(report.observation, None);
    assert_eq!(weather.calls(), 3);
    assert_eq!(clock.sleeps().len(), 2);
}

#[tokio::test]
async fn malformed_body_gives_up_immediately() {
    let weather = Arc::new(ScriptedWeather::always(Err(FetchFailure::Decode(
        "missing sys".to_string(),
    ))));
    let clock = Arc::new(ManualClock::new(NOW));
    let report = gate(weather.clone(), clock.clone()).evaluate().await.unwrap();
    assert!(report.degraded);
    assert_eq!(weather.calls(), 1);
    assert!(clock.sleeps().is_empty());
}

#[tokio::test]
async fn auth_and_location_errors_are_fatal() {
    for (status, expect_auth) in [(401, true), (404, false)] {
        let weather = Arc::new(ScriptedWeather::always(Err(FetchFailure::Status(status))));
        let clock = Arc::new(ManualClock::new(NOW));
        let err = gate(weather.clone(), clock.clone())
            .evaluate()
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(matches!(err, SolstatError::Auth { .. }), expect_auth);
        assert_eq!(weather.calls(), 1);
        assert!(clock.sleeps().is_empty());
    }
}
