use super::{RecordStore, StatusRecord};
use crate::error::{Result, SolstatError};
use crate::logging::get_logger;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS status_records (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    EpochLastReport INTEGER NOT NULL,
    LastReport      TEXT    NOT NULL,
    Collected       REAL    NOT NULL,
    Status          TEXT    NOT NULL,
    Reporting       INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_status_records_epoch
    ON status_records (EpochLastReport);
CREATE TABLE IF NOT EXISTS schedule (
    key   TEXT PRIMARY KEY,
    epoch INTEGER NOT NULL
);
";

/// SQLite-backed historical store
pub struct SqliteStore {
    conn: Mutex<Connection>,
    logger: crate::logging::StructuredLogger,
}

impl SqliteStore {
    /// Open (creating if needed) the database and verify it answers.
    ///
    /// `connect_timeout` bounds how long any statement waits on a locked
    /// database before failing.
    pub fn open<P: AsRef<Path>>(path: P, connect_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        let logger = get_logger("store");
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SolstatError::store(format!(
                        "Cannot create store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(path).map_err(|e| {
            SolstatError::store(format!("Cannot open store {}: {}", path.display(), e))
        })?;
        conn.busy_timeout(connect_timeout)?;
        conn.execute_batch(SCHEMA)?;

        let store = Self {
            conn: Mutex::new(conn),
            logger,
        };
        store.ping()?;
        store
            .logger
            .info(&format!("Opened historical store at {}", path.display()));
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            logger: get_logger("store"),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| SolstatError::store("Store connection lock poisoned"))
    }
}

fn to_u64(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

impl RecordStore for SqliteStore {
    fn ping(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))
            .map_err(|e| SolstatError::store(format!("Store not available: {}", e)))?;
        Ok(())
    }

    fn insert(&self, record: &StatusRecord) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO status_records (EpochLastReport, LastReport, Collected, Status, Reporting)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.epoch_last_report,
                record.last_report,
                record.collected,
                record.status,
                record.reporting
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn latest(&self) -> Result<Option<StatusRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT EpochLastReport, LastReport, Collected, Status, Reporting
                 FROM status_records ORDER BY id DESC LIMIT 1",
                [],
                |r| {
                    Ok(StatusRecord {
                        epoch_last_report: r.get(0)?,
                        last_report: r.get(1)?,
                        collected: r.get(2)?,
                        status: r.get(3)?,
                        reporting: r.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn count_older_than(&self, cutoff_epoch: i64) -> Result<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM status_records WHERE EpochLastReport < ?1",
            params![cutoff_epoch],
            |r| r.get(0),
        )?;
        Ok(to_u64(n))
    }

    fn delete_older_than(&self, cutoff_epoch: i64) -> Result<u64> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM status_records WHERE EpochLastReport < ?1",
            params![cutoff_epoch],
        )?;
        Ok(deleted as u64)
    }

    fn estimated_count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM status_records", [], |r| r.get(0))?;
        Ok(to_u64(n))
    }

    fn load_schedule(&self, key: &str) -> Result<Option<i64>> {
        let conn = self.conn()?;
        let epoch = conn
            .query_row(
                "SELECT epoch FROM schedule WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(epoch)
    }

    fn save_schedule(&self, key: &str, epoch: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO schedule (key, epoch) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET epoch = excluded.epoch",
            params![key, epoch],
        )?;
        Ok(())
    }
}
