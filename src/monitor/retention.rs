//! Time-windowed pruning of the historical store

use crate::config::RetentionConfig;
use crate::error::Result;
use crate::logging::get_logger;
use crate::store::{RETENTION_SCHEDULE_KEY, RecordStore};
use serde::Serialize;
use std::sync::Arc;

/// Default retention horizon (4 days)
pub const DEFAULT_RETENTION_WINDOW_SECS: i64 = 4 * 86_400;
/// Default time between pruning runs (24 hours)
pub const DEFAULT_RETENTION_INTERVAL_SECS: i64 = 86_400;

/// Outcome of one pruning run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Records older than this epoch were removed
    pub cutoff: i64,
    pub count_before: u64,
    pub count_deleted: u64,
    pub count_after: u64,
    /// When the next run becomes due
    pub next_run_at: i64,
}

/// Owns the pruning schedule; nothing else reads or writes it
pub struct RetentionManager {
    store: Arc<dyn RecordStore>,
    window_secs: i64,
    interval_secs: i64,
    next_run_at: i64,
    logger: crate::logging::StructuredLogger,
}

impl RetentionManager {
    /// Resume the schedule persisted in the store, or start a fresh one
    /// that first runs one interval from `now`.
    pub fn resume(store: Arc<dyn RecordStore>, config: &RetentionConfig, now: i64) -> Self {
        let logger = get_logger("retention");
        let persisted = match store.load_schedule(RETENTION_SCHEDULE_KEY) {
            Ok(v) => v,
            Err(e) => {
                logger.warn(&format!("Could not read retention schedule: {}", e));
                None
            }
        };
        let next_run_at = match persisted {
            Some(at) => {
                logger.info(&format!("Resuming retention schedule, next run at {}", at));
                at
            }
            None => {
                let at = now.saturating_add(config.interval_seconds);
                if let Err(e) = store.save_schedule(RETENTION_SCHEDULE_KEY, at) {
                    logger.warn(&format!("Could not persist retention schedule: {}", e));
                }
                at
            }
        };
        Self {
            store,
            window_secs: config.window_seconds,
            interval_secs: config.interval_seconds,
            next_run_at,
            logger,
        }
    }

    pub fn next_run_at(&self) -> i64 {
        self.next_run_at
    }

    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    pub fn is_due(&self, now: i64) -> bool {
        now >= self.next_run_at
    }

    /// Prune when due; `Ok(None)` when the schedule says not yet.
    ///
    /// A failed delete leaves the schedule untouched so the very next check
    /// tries again instead of skipping a day. Once the delete succeeded the
    /// schedule advances even if the recount fails.
    pub fn maybe_prune(&mut self, now: i64) -> Result<Option<PruneReport>> {
        if !self.is_due(now) {
            return Ok(None);
        }

        let cutoff = now.saturating_sub(self.window_secs);
        let count_before = self.store.estimated_count()?;
        let eligible = self.store.count_older_than(cutoff)?;
        self.logger.info(&format!(
            "Pruning records older than {} (docs: {}, to delete: {})",
            cutoff, count_before, eligible
        ));

        let count_deleted = match self.store.delete_older_than(cutoff) {
            Ok(n) => n,
            Err(e) => {
                self.logger.error(&format!(
                    "Prune failed, will retry at next check: {}",
                    e
                ));
                return Err(e);
            }
        };
        let expected_after = count_before.saturating_sub(count_deleted);
        let count_after = match self.store.estimated_count() {
            Ok(n) => n,
            Err(e) => {
                self.logger
                    .warn(&format!("Could not recount after prune: {}", e));
                expected_after
            }
        };
        if count_deleted != eligible || count_after != expected_after {
            self.logger.warn(&format!(
                "Store changed during prune (eligible {}, deleted {}, before {}, after {})",
                eligible, count_deleted, count_before, count_after
            ));
        }

        self.next_run_at = now.saturating_add(self.interval_secs);
        if let Err(e) = self
            .store
            .save_schedule(RETENTION_SCHEDULE_KEY, self.next_run_at)
        {
            self.logger
                .warn(&format!("Could not persist retention schedule: {}", e));
        }

        let report = PruneReport {
            cutoff,
            count_before,
            count_deleted,
            count_after,
            next_run_at: self.next_run_at,
        };
        self.logger.info(&format!(
            "Prune complete: before {}, deleted {}, after {}",
            report.count_before, report.count_deleted, report.count_after
        ));
        Ok(Some(report))
    }
}
