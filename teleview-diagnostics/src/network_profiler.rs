//! Bitrate estimation from cumulative byte counters

use std::time::Instant;

/// Turns successive cumulative byte counts into a bitrate
#[derive(Debug, Default)]
pub struct BitrateEstimator {
    last: Option<(Instant, u64)>,
}

impl BitrateEstimator {
    /// Create new estimator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cumulative byte count and return kbps since the previous call
    pub fn update(&mut self, bytes_total: u64) -> f64 {
        self.update_at(Instant::now(), bytes_total)
    }

    /// Same as [`update`](Self::update) with an explicit sample time
    pub fn update_at(&mut self, now: Instant, bytes_total: u64) -> f64 {
        let kbps = match self.last {
            Some((then, previous)) if bytes_total >= previous => {
                let elapsed = now.saturating_duration_since(then).as_secs_f64();
                if elapsed > 0.0 {
                    (bytes_total - previous) as f64 * 8.0 / elapsed / 1000.0
                } else {
                    0.0
                }
            }
            // First sample, or the counter went backwards after a new session
            _ => 0.0,
        };
        self.last = Some((now, bytes_total));
        kbps
    }

    /// Forget previous samples
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_first_sample_reports_zero() {
        let mut estimator = BitrateEstimator::new();
        assert_eq!(estimator.update(1_000_000), 0.0);
    }

    #[test]
    fn test_bitrate_over_interval() {
        let mut estimator = BitrateEstimator::new();
        let start = Instant::now();
        estimator.update_at(start, 0);
        let kbps = estimator.update_at(start + Duration::from_secs(2), 250_000);
        assert!((kbps - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_counter_reset_reports_zero() {
        let mut estimator = BitrateEstimator::new();
        let start = Instant::now();
        estimator.update_at(start, 500_000);
        assert_eq!(estimator.update_at(start + Duration::from_secs(1), 10), 0.0);
        let kbps = estimator.update_at(start + Duration::from_secs(2), 125_010);
        assert!((kbps - 1000.0).abs() < 1e-6);
    }
}
