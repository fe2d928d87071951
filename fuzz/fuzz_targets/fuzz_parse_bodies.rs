#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    // Both API decoders must reject junk without panicking
    if let Ok(obs) = solstat::weather::parse_weather_body(body) {
        let _ = solstat::weather::classify_conditions(&obs, obs.sunrise);
    }
    let _ = solstat::vendor::parse_summary_body(body);
});
