//! Injectable wall clock and sleep
//!
//! The monitor never reads the system time or sleeps directly; it goes
//! through [`Clock`] so tests can move time without waiting.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    /// Current UTC epoch seconds
    fn now_epoch(&self) -> i64;

    /// Wait for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Real time via chrono and tokio
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now_epoch(&self) -> i64 {
        Utc::now().timestamp()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Simulated time: sleeping advances the clock instantly
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(start_epoch: i64) -> Self {
        Self {
            now: AtomicI64::new(start_epoch),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, epoch: i64) {
        self.now.store(epoch, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Every duration passed to `sleep`, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Clock for ManualClock {
    fn now_epoch(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    async fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        self.advance(i64::try_from(duration.as_secs()).unwrap_or(i64::MAX));
        // Let other tasks observe the new time
        tokio::task::yield_now().await;
    }
}

/// Render an epoch in `tz` for log lines (`%m-%d-%Y %H:%M:%S`)
pub fn format_local(epoch: i64, tz: Tz) -> String {
    DateTime::<Utc>::from_timestamp(epoch, 0)
        .map(|dt| dt.with_timezone(&tz).format("%m-%d-%Y %H:%M:%S").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_clock_advances_on_sleep() {
        let clock = ManualClock::new(1_000);
        clock.sleep(Duration::from_secs(1_800)).await;
        clock.sleep(Duration::from_millis(500)).await;
        assert_eq!(clock.now_epoch(), 2_800);
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(1_800), Duration::from_millis(500)]
        );
    }

    #[test]
    fn local_rendering_uses_timezone() {
        assert_eq!(format_local(1_700_000_000, chrono_tz::UTC), "11-14-2023 22:13:20");
        assert_eq!(
            format_local(1_700_000_000, chrono_tz::America::New_York),
            "11-14-2023 17:13:20"
        );
    }
}
