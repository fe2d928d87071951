use super::{RecordStore, StatusRecord};
use crate::error::{Result, SolstatError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    next_id: i64,
    records: Vec<(i64, StatusRecord)>,
    schedule: HashMap<String, i64>,
}

/// Volatile store with switchable failure modes
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    unreachable: AtomicBool,
    fail_deletes: AtomicBool,
    fail_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store, in the order given
    pub fn with_records<I: IntoIterator<Item = StatusRecord>>(records: I) -> Self {
        let store = Self::new();
        for record in records {
            let _ = store.insert(&record);
        }
        store
    }

    /// Make every operation fail as if the server were gone
    pub fn set_unreachable(&self, value: bool) {
        self.unreachable.store(value, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, value: bool) {
        self.fail_deletes.store(value, Ordering::SeqCst);
    }

    pub fn set_fail_inserts(&self, value: bool) {
        self.fail_inserts.store(value, Ordering::SeqCst);
    }

    /// Snapshot of stored records in insertion order
    pub fn records(&self) -> Vec<StatusRecord> {
        self.inner
            .lock()
            .map(|inner| inner.records.iter().map(|(_, r)| r.clone()).collect())
            .unwrap_or_default()
    }

    fn guard(&self) -> Result<MutexGuard<'_, Inner>> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(SolstatError::store("Store not available"));
        }
        self.inner
            .lock()
            .map_err(|_| SolstatError::store("Memory store lock poisoned"))
    }
}

impl RecordStore for MemoryStore {
    fn ping(&self) -> Result<()> {
        self.guard().map(|_| ())
    }

    fn insert(&self, record: &StatusRecord) -> Result<i64> {
        let mut inner = self.guard()?;
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(SolstatError::store("Insert rejected"));
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.push((id, record.clone()));
        Ok(id)
    }

    fn latest(&self) -> Result<Option<StatusRecord>> {
        let inner = self.guard()?;
        Ok(inner
            .records
            .iter()
            .max_by_key(|(id, _)| *id)
            .map(|(_, r)| r.clone()))
    }

    fn count_older_than(&self, cutoff_epoch: i64) -> Result<u64> {
        let inner = self.guard()?;
        Ok(inner
            .records
            .iter()
            .filter(|(_, r)| r.epoch_last_report < cutoff_epoch)
            .count() as u64)
    }

    fn delete_older_than(&self, cutoff_epoch: i64) -> Result<u64> {
        let mut inner = self.guard()?;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(SolstatError::store("Delete rejected"));
        }
        let before = inner.records.len();
        inner
            .records
            .retain(|(_, r)| r.epoch_last_report >= cutoff_epoch);
        Ok((before - inner.records.len()) as u64)
    }

    fn estimated_count(&self) -> Result<u64> {
        Ok(self.guard()?.records.len() as u64)
    }

    fn load_schedule(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.guard()?.schedule.get(key).copied())
    }

    fn save_schedule(&self, key: &str, epoch: i64) -> Result<()> {
        self.guard()?.schedule.insert(key.to_string(), epoch);
        Ok(())
    }
}
