use super::*;

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "/data/solstat.db".to_string(),
            connect_timeout_ms: 30_000,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            location: String::new(),
            units: "imperial".to_string(),
            base_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            request_timeout_ms: 10_000,
            max_attempts: 3,
            backoff_base_ms: 2_000,
            rate_limit_backoff_seconds: 1_800,
        }
    }
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.enphaseenergy.com/api/v2".to_string(),
            api_key: String::new(),
            user_id: String::new(),
            system_id: String::new(),
            request_timeout_ms: 10_000,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            staleness_threshold_seconds: 86_400,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            window_seconds: 345_600,
            interval_seconds: 86_400,
        }
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            blue: 17,
            green: 25,
            red: 23,
            amber: 20,
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            backend: IndicatorBackend::Sysfs,
            gpio_root: "/sys/class/gpio".to_string(),
            pins: PinConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/solstat.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceKind::Store,
            poll_interval_seconds: 1_800,
            timezone: "UTC".to_string(),
            store: StoreConfig::default(),
            weather: WeatherConfig::default(),
            vendor: VendorConfig::default(),
            health: HealthConfig::default(),
            retention: RetentionConfig::default(),
            indicators: IndicatorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
