//! Freshness classification of status samples
//!
//! All arithmetic is on UTC epoch seconds; no local-time rendering is
//! involved, so the sample's and the host's timezones never matter.

use super::types::{Staleness, StatusSample};

/// Default reporting threshold (24 hours)
pub const DEFAULT_STALENESS_THRESHOLD_SECS: i64 = 86_400;

#[derive(Debug, Clone, Copy)]
pub struct StalenessEvaluator {
    threshold_secs: i64,
}

impl Default for StalenessEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS_THRESHOLD_SECS)
    }
}

impl StalenessEvaluator {
    pub fn new(threshold_secs: i64) -> Self {
        Self { threshold_secs }
    }

    pub fn threshold_secs(&self) -> i64 {
        self.threshold_secs
    }

    /// Seconds between the sample's last report and `now`
    pub fn elapsed_seconds(sample: &StatusSample, now: i64) -> i64 {
        now.saturating_sub(sample.last_report_epoch)
    }

    /// `Timely` up to and including the threshold, `Delayed` beyond it.
    ///
    /// A report stamped in the future (clock skew) counts as timely.
    pub fn classify(&self, sample: &StatusSample, now: i64) -> Staleness {
        if Self::elapsed_seconds(sample, now) <= self.threshold_secs {
            Staleness::Timely
        } else {
            Staleness::Delayed
        }
    }
}

/// Render an elapsed duration the way operators read it, e.g. `1d 03:46:40`
pub fn format_elapsed(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let s = seconds.unsigned_abs();
    let (days, rem) = (s / 86_400, s % 86_400);
    let (h, m, sec) = (rem / 3_600, (rem % 3_600) / 60, rem % 60);
    if days > 0 {
        format!("{}{}d {:02}:{:02}:{:02}", sign, days, h, m, sec)
    } else {
        format!("{}{:02}:{:02}:{:02}", sign, h, m, sec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn sample_at(epoch: i64) -> StatusSample {
        StatusSample::new(epoch, 0.0, "normal")
    }

    #[test]
    fn boundary_is_timely() {
        let eval = StalenessEvaluator::default();
        assert_eq!(eval.classify(&sample_at(NOW - 86_400), NOW), Staleness::Timely);
        assert_eq!(
            eval.classify(&sample_at(NOW - 86_401), NOW),
            Staleness::Delayed
        );
    }

    #[test]
    fn sweep_around_threshold() {
        let eval = StalenessEvaluator::default();
        for elapsed in [0, 1, 1_000, 43_200, 86_399, 86_400] {
            assert_eq!(
                eval.classify(&sample_at(NOW - elapsed), NOW),
                Staleness::Timely,
                "elapsed {}",
                elapsed
            );
        }
        for elapsed in [86_401, 100_000, 345_600, 10_000_000] {
            assert_eq!(
                eval.classify(&sample_at(NOW - elapsed), NOW),
                Staleness::Delayed,
                "elapsed {}",
                elapsed
            );
        }
    }

    #[test]
    fn future_report_is_timely() {
        let eval = StalenessEvaluator::default();
        assert_eq!(eval.classify(&sample_at(NOW + 600), NOW), Staleness::Timely);
    }

    #[test]
    fn custom_threshold() {
        let eval = StalenessEvaluator::new(3_600);
        assert_eq!(eval.classify(&sample_at(NOW - 3_600), NOW), Staleness::Timely);
        assert_eq!(eval.classify(&sample_at(NOW - 3_601), NOW), Staleness::Delayed);
    }

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(1_000), "00:16:40");
        assert_eq!(format_elapsed(100_000), "1d 03:46:40");
        assert_eq!(format_elapsed(-5), "-00:00:05");
    }
}
