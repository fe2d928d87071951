//! Historical record store
//!
//! Append-only collection of status documents plus a tiny key/value table
//! for schedules that must survive a restart. The daemon only needs a
//! handful of operations, captured by [`RecordStore`].

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Schedule key for the next retention run
pub const RETENTION_SCHEDULE_KEY: &str = "retention.next_run_at";

/// One stored status document, using the historical field names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Epoch seconds of the array's last report
    #[serde(rename = "EpochLastReport")]
    pub epoch_last_report: i64,

    /// Same instant rendered as RFC 3339 UTC
    #[serde(rename = "LastReport")]
    pub last_report: String,

    /// Energy figure from the vendor, passed through untouched
    #[serde(rename = "Collected")]
    pub collected: f64,

    /// Vendor status text
    #[serde(rename = "Status")]
    pub status: String,

    /// Liveness flag derived from `status` when the record was written
    #[serde(rename = "Reporting")]
    pub reporting: bool,
}

impl StatusRecord {
    /// Build a record, rendering `LastReport` from the epoch
    pub fn new(epoch_last_report: i64, collected: f64, status: &str, reporting: bool) -> Self {
        let last_report = DateTime::<Utc>::from_timestamp(epoch_last_report, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        Self {
            epoch_last_report,
            last_report,
            collected,
            status: status.to_string(),
            reporting,
        }
    }
}

/// Operations the daemon needs from the historical store.
///
/// Implementations must keep insertion order for [`RecordStore::latest`].
pub trait RecordStore: Send + Sync {
    /// Liveness check; an error means the store is unreachable
    fn ping(&self) -> Result<()>;

    /// Append one record, returning its insertion id
    fn insert(&self, record: &StatusRecord) -> Result<i64>;

    /// Most recently inserted record
    fn latest(&self) -> Result<Option<StatusRecord>>;

    /// Number of records with `EpochLastReport < cutoff`
    fn count_older_than(&self, cutoff_epoch: i64) -> Result<u64>;

    /// Delete records with `EpochLastReport < cutoff`, returning how many went
    fn delete_older_than(&self, cutoff_epoch: i64) -> Result<u64>;

    /// Total number of records
    fn estimated_count(&self) -> Result<u64>;

    /// Read a persisted schedule timestamp
    fn load_schedule(&self, key: &str) -> Result<Option<i64>>;

    /// Persist a schedule timestamp
    fn save_schedule(&self, key: &str, epoch: i64) -> Result<()>;
}
