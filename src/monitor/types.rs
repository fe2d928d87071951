use crate::store::StatusRecord;
use serde::Serialize;

/// One reporting snapshot of the array, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSample {
    /// Epoch seconds of the array's most recent report
    pub last_report_epoch: i64,
    /// Energy figure from the vendor, opaque to the monitor
    pub collected_energy: f64,
    /// Vendor status text (`normal`, `comm`, `power`, ...)
    pub status: String,
    /// Whether the array declares itself alive
    pub is_reporting: bool,
}

/// Liveness implied by a vendor status string; `None` when there is none
pub fn reporting_from_status(status: &str) -> Option<bool> {
    let status = status.trim();
    if status.is_empty() {
        None
    } else {
        Some(status.eq_ignore_ascii_case("normal"))
    }
}

impl StatusSample {
    pub fn new(last_report_epoch: i64, collected_energy: f64, status: &str) -> Self {
        Self {
            last_report_epoch,
            collected_energy,
            status: status.to_string(),
            is_reporting: reporting_from_status(status).unwrap_or(false),
        }
    }

    /// Derive a sample from a stored document.
    ///
    /// Liveness comes from the measured status; the stored `Reporting` flag
    /// only fills in for legacy documents without one.
    pub fn from_record(record: &StatusRecord) -> Self {
        Self {
            last_report_epoch: record.epoch_last_report,
            collected_energy: record.collected,
            status: record.status.clone(),
            is_reporting: reporting_from_status(&record.status).unwrap_or(record.reporting),
        }
    }

    pub fn to_record(&self) -> StatusRecord {
        StatusRecord::new(
            self.last_report_epoch,
            self.collected_energy,
            &self.status,
            self.is_reporting,
        )
    }
}

/// Freshness of a sample relative to the staleness threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Staleness {
    Timely,
    Delayed,
}

/// Health of the array for one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthState {
    Up,
    Down,
    AwaitingDaylight,
}

/// Combined classification for one cycle; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub daylight_favorable: bool,
    /// Only computed while daylight is favorable
    pub staleness: Option<Staleness>,
    pub health: HealthState,
}
