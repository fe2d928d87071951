//! Status sources: where each cycle's sample comes from

use crate::error::{Result, SolstatError};
use crate::logging::get_logger;
use crate::monitor::StatusSample;
use crate::store::RecordStore;
use crate::vendor::VendorApi;
use std::sync::Arc;

/// What one fetch produced
#[derive(Debug, Clone, PartialEq)]
pub struct SourceOutcome {
    /// `None` when nothing could be obtained this cycle
    pub sample: Option<StatusSample>,
    /// The store answered during this fetch
    pub connected: bool,
}

#[async_trait::async_trait]
pub trait StatusSource: Send + Sync {
    /// Latest sample. Errors only when the daemon must stop.
    async fn fetch_latest(&self) -> Result<SourceOutcome>;

    /// Short name for log lines
    fn name(&self) -> &'static str;
}

/// Reads the most recently inserted record from the store
pub struct StoreSource {
    store: Arc<dyn RecordStore>,
    logger: crate::logging::StructuredLogger,
}

impl StoreSource {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            logger: get_logger("source"),
        }
    }
}

#[async_trait::async_trait]
impl StatusSource for StoreSource {
    async fn fetch_latest(&self) -> Result<SourceOutcome> {
        if let Err(e) = self.store.ping() {
            self.logger.error(&format!("Store unreachable: {}", e));
            return Err(SolstatError::store(format!("store unreachable: {}", e)));
        }
        let sample = self.store.latest()?.map(|r| StatusSample::from_record(&r));
        if sample.is_none() {
            self.logger.warn("Store holds no status records yet");
        }
        Ok(SourceOutcome {
            sample,
            connected: true,
        })
    }

    fn name(&self) -> &'static str {
        "store"
    }
}

/// Polls the vendor API and appends each sample to the store
pub struct VendorSource {
    api: Arc<dyn VendorApi>,
    store: Arc<dyn RecordStore>,
    logger: crate::logging::StructuredLogger,
}

impl VendorSource {
    pub fn new(api: Arc<dyn VendorApi>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            api,
            store,
            logger: get_logger("source"),
        }
    }

    fn persist(&self, sample: &StatusSample) -> bool {
        if let Err(e) = self.store.ping() {
            self.logger
                .error(&format!("Store unreachable, sample not saved: {}", e));
            return false;
        }
        match self.store.insert(&sample.to_record()) {
            Ok(id) => self.logger.debug(&format!("Inserted record {}", id)),
            Err(e) => self
                .logger
                .error(&format!("Insert failed, retrying next cycle: {}", e)),
        }
        true
    }
}

#[async_trait::async_trait]
impl StatusSource for VendorSource {
    async fn fetch_latest(&self) -> Result<SourceOutcome> {
        let summary = match self.api.fetch_summary().await {
            Ok(s) => s,
            Err(e) => {
                self.logger.error(&format!("Vendor fetch failed: {}", e));
                return Ok(SourceOutcome {
                    sample: None,
                    connected: self.store.ping().is_ok(),
                });
            }
        };
        let sample = StatusSample::new(summary.last_report_at, summary.energy_today, &summary.status);
        self.logger.info(&format!(
            "Vendor status '{}', energy today {}, last report {}",
            sample.status, sample.collected_energy, sample.last_report_epoch
        ));
        let connected = self.persist(&sample);
        Ok(SourceOutcome {
            sample: Some(sample),
            connected,
        })
    }

    fn name(&self) -> &'static str {
        "vendor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StatusRecord};
    use crate::vendor::VendorSummary;

    struct FixedVendor(Option<VendorSummary>);

    #[async_trait::async_trait]
    impl VendorApi for FixedVendor {
        async fn fetch_summary(&self) -> Result<VendorSummary> {
            self.0
                .clone()
                .ok_or_else(|| SolstatError::network("connection refused"))
        }
    }

    fn summary(status: &str) -> VendorSummary {
        VendorSummary {
            last_report_at: 1_699_999_000,
            status: status.to_string(),
            energy_today: 25_190.0,
        }
    }

    #[tokio::test]
    async fn store_source_reads_latest() {
        let store = Arc::new(MemoryStore::with_records([
            StatusRecord::new(10, 1.0, "normal", true),
            StatusRecord::new(5, 2.0, "comm", false),
        ]));
        let out = StoreSource::new(store).fetch_latest().await.unwrap();
        assert!(out.connected);
        let sample = out.sample.unwrap();
        assert_eq!(sample.last_report_epoch, 5);
        assert!(!sample.is_reporting);
    }

    #[tokio::test]
    async fn store_source_unreachable_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        store.set_unreachable(true);
        let err = StoreSource::new(store).fetch_latest().await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn vendor_sample_is_persisted() {
        let store = Arc::new(MemoryStore::new());
        let src = VendorSource::new(Arc::new(FixedVendor(Some(summary("normal")))), store.clone());
        let out = src.fetch_latest().await.unwrap();
        assert!(out.connected);
        assert!(out.sample.unwrap().is_reporting);
        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].epoch_last_report, 1_699_999_000);
        assert!(records[0].reporting);
    }

    #[tokio::test]
    async fn vendor_failure_yields_no_sample() {
        let store = Arc::new(MemoryStore::new());
        let src = VendorSource::new(Arc::new(FixedVendor(None)), store.clone());
        let out = src.fetch_latest().await.unwrap();
        assert_eq!(out.sample, None);
        assert!(out.connected);
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn insert_failure_is_absorbed() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_inserts(true);
        let src = VendorSource::new(Arc::new(FixedVendor(Some(summary("comm")))), store.clone());
        let out = src.fetch_latest().await.unwrap();
        assert!(!out.sample.unwrap().is_reporting);
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn unreachable_store_clears_connectivity() {
        let store = Arc::new(MemoryStore::new());
        store.set_unreachable(true);
        let src = VendorSource::new(Arc::new(FixedVendor(Some(summary("normal")))), store);
        let out = src.fetch_latest().await.unwrap();
        assert!(out.sample.is_some());
        assert!(!out.connected);
    }
}
