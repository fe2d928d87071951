//! Status-reconciliation loop
//!
//! One [`Monitor`] owns every collaborator for the life of the process. Each
//! cycle walks the weather gate, the status source, the staleness check and
//! the verdict table, drives the lamps, and gives the retention manager a
//! chance to prune before sleeping until the next poll.

mod clock;
mod retention;
mod staleness;
mod types;
mod verdict;


pub use clock::{Clock, ManualClock, SystemClock, format_local};
pub use retention::{
    DEFAULT_RETENTION_INTERVAL_SECS, DEFAULT_RETENTION_WINDOW_SECS, PruneReport, RetentionManager,
};
pub use staleness::{DEFAULT_STALENESS_THRESHOLD_SECS, StalenessEvaluator, format_elapsed};
pub use types::{HealthState, Staleness, StatusSample, Verdict, reporting_from_status};
pub use verdict::decide;

use crate::config::{Config, SourceKind};
use crate::error::Result;
use crate::indicator::{IndicatorCommand, IndicatorOutput, apply_command, open_indicators};
use crate::logging::get_logger;
use crate::source::{StatusSource, StoreSource, VendorSource};
use crate::store::{RecordStore, SqliteStore};
use crate::vendor::EnphaseClient;
use crate::weather::{OpenWeatherClient, RetryPolicy, WeatherApi, WeatherGate, WeatherReport};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    /// Weather gate and status source
    Polling,
    /// Staleness and verdict
    Evaluating,
    /// Retention check
    Maintaining,
    Sleeping,
}

/// Everything one cycle decided
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub weather: WeatherReport,
    /// `None` when favorable but no sample could be obtained
    pub verdict: Option<Verdict>,
    pub command: IndicatorCommand,
    /// Store answered this cycle (blue lamp)
    pub connectivity: bool,
    pub prune: Option<PruneReport>,
    pub started_at: i64,
    pub next_poll_at: i64,
}

/// Collaborators for [`Monitor::new`]
pub struct MonitorParts {
    pub store: Arc<dyn RecordStore>,
    pub weather: Arc<dyn WeatherApi>,
    pub source: Box<dyn StatusSource>,
    pub indicators: Box<dyn IndicatorOutput>,
    pub clock: Arc<dyn Clock>,
}

pub struct Monitor {
    config: Config,
    tz: Tz,
    gate: WeatherGate,
    source: Box<dyn StatusSource>,
    store: Arc<dyn RecordStore>,
    retention: RetentionManager,
    staleness: StalenessEvaluator,
    indicators: Box<dyn IndicatorOutput>,
    clock: Arc<dyn Clock>,
    first_run: bool,
    phase: CyclePhase,
    logger: crate::logging::StructuredLogger,
}

impl Monitor {
    pub fn new(config: Config, parts: MonitorParts) -> Result<Self> {
        let tz = config.tz()?;
        let logger = get_logger("monitor");
        let now = parts.clock.now_epoch();
        let retention = RetentionManager::resume(parts.store.clone(), &config.retention, now);
        let gate = WeatherGate::new(
            parts.weather,
            RetryPolicy::from_config(&config.weather),
            parts.clock.clone(),
        );
        logger.info(&format!(
            "Monitor ready: source {}, poll every {}s, staleness threshold {}s, next prune {}",
            parts.source.name(),
            config.poll_interval_seconds,
            config.health.staleness_threshold_seconds,
            format_local(retention.next_run_at(), tz)
        ));
        Ok(Self {
            tz,
            gate,
            source: parts.source,
            store: parts.store,
            retention,
            staleness: StalenessEvaluator::new(config.health.staleness_threshold_seconds),
            indicators: parts.indicators,
            clock: parts.clock,
            first_run: true,
            phase: CyclePhase::Idle,
            logger,
            config,
        })
    }

    /// Wire up the production collaborators described by `config`.
    ///
    /// Fails when the store cannot be opened or the lamps cannot be claimed.
    pub fn from_config(config: Config) -> Result<Self> {
        let store: Arc<dyn RecordStore> = Arc::new(SqliteStore::open(
            &config.store.path,
            Duration::from_millis(config.store.connect_timeout_ms),
        )?);
        let weather: Arc<dyn WeatherApi> = Arc::new(OpenWeatherClient::new(&config.weather)?);
        let source: Box<dyn StatusSource> = match config.source {
            SourceKind::Store => Box::new(StoreSource::new(store.clone())),
            SourceKind::Vendor => Box::new(VendorSource::new(
                Arc::new(EnphaseClient::new(&config.vendor)?),
                store.clone(),
            )),
        };
        let indicators = open_indicators(&config.indicators)?;
        Self::new(
            config,
            MonitorParts {
                store,
                weather,
                source,
                indicators,
                clock: Arc::new(SystemClock),
            },
        )
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn retention(&self) -> &RetentionManager {
        &self.retention
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.poll_interval_seconds)
    }

    /// One pass through gate, source, verdict, lamps and retention.
    ///
    /// Returns an error only for conditions that must stop the daemon.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let started_at = self.clock.now_epoch();
        self.phase = CyclePhase::Polling;
        self.logger.info(&format!(
            "Cycle start {} (first run: {})",
            format_local(started_at, self.tz),
            self.first_run
        ));

        let weather = self.gate.evaluate().await?;
        if weather.degraded {
            self.logger
                .warn("Weather unavailable, treating conditions as favorable");
        }

        let (verdict, connectivity) = if weather.favorable {
            let outcome = self.source.fetch_latest().await?;
            self.phase = CyclePhase::Evaluating;
            let verdict = match outcome.sample {
                Some(sample) => Some(self.evaluate_sample(&sample)),
                None => {
                    self.logger
                        .warn("No status sample available, showing awaiting daylight");
                    None
                }
            };
            (verdict, outcome.connected)
        } else {
            self.phase = CyclePhase::Evaluating;
            self.logger
                .info("Conditions not favorable, awaiting daylight");
            (Some(Verdict::awaiting_daylight()), self.store.ping().is_ok())
        };

        let command = verdict
            .map(|v| v.indicator_command())
            .unwrap_or(IndicatorCommand::AmberOnly);
        if let Err(e) = apply_command(self.indicators.as_mut(), command, connectivity) {
            self.logger
                .error(&format!("Failed to drive indicators: {}", e));
        }

        self.phase = CyclePhase::Maintaining;
        let prune = self.maintain();

        let finished_at = self.clock.now_epoch();
        let poll_secs = i64::try_from(self.config.poll_interval_seconds).unwrap_or(i64::MAX);
        let next_poll_at = finished_at.saturating_add(poll_secs);
        self.logger.info(&format!(
            "Cycle done in {}s: {:?}, blue {}, next poll {}",
            finished_at - started_at,
            command,
            if connectivity { "on" } else { "off" },
            format_local(next_poll_at, self.tz)
        ));
        self.first_run = false;
        self.phase = CyclePhase::Idle;

        Ok(CycleReport {
            weather,
            verdict,
            command,
            connectivity,
            prune,
            started_at,
            next_poll_at,
        })
    }

    fn evaluate_sample(&self, sample: &StatusSample) -> Verdict {
        let now = self.clock.now_epoch();
        let staleness = self.staleness.classify(sample, now);
        self.logger.info(&format!(
            "Last report {} ({} ago), status '{}', energy {}",
            format_local(sample.last_report_epoch, self.tz),
            format_elapsed(StalenessEvaluator::elapsed_seconds(sample, now)),
            sample.status,
            sample.collected_energy
        ));
        let verdict = decide(true, sample, staleness);
        if verdict.is_up_but_stale() {
            self.logger.warn(&format!(
                "Array reporting but last report exceeds {}s",
                self.staleness.threshold_secs()
            ));
        }
        verdict
    }

    fn maintain(&mut self) -> Option<PruneReport> {
        let now = self.clock.now_epoch();
        match self.retention.maybe_prune(now) {
            Ok(Some(report)) => Some(report),
            Ok(None) => {
                self.logger.info(&format!(
                    "Next prune in {} at {}",
                    format_elapsed(self.retention.next_run_at().saturating_sub(now)),
                    format_local(self.retention.next_run_at(), self.tz)
                ));
                None
            }
            Err(e) => {
                self.logger.error(&format!("Retention run failed: {}", e));
                None
            }
        }
    }

    /// Cycle forever; only fatal errors end the loop
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info("Starting monitor loop");
        loop {
            let report = self.run_cycle().await?;
            self.phase = CyclePhase::Sleeping;
            let now = self.clock.now_epoch();
            let wait = u64::try_from(report.next_poll_at.saturating_sub(now)).unwrap_or(0);
            self.logger.debug(&format!(
                "Sleeping {}s until {}",
                wait,
                format_local(report.next_poll_at, self.tz)
            ));
            self.clock.sleep(Duration::from_secs(wait)).await;
        }
    }

    /// Turn every lamp off; call once on the way out
    pub fn release(&mut self) {
        self.phase = CyclePhase::Idle;
        match self.indicators.all_off() {
            Ok(()) => self.logger.info("Indicators released"),
            Err(e) => self
                .logger
                .error(&format!("Failed to release indicators: {}", e)),
        }
    }
}
