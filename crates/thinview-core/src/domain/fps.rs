//! Exponential moving average of the presented frame rate.

use std::time::Duration;

/// Weight given to the history on every update.
pub const SMOOTHING: f64 = 0.9;

/// Tracks the instantaneous and smoothed frames-per-second.
///
/// `average = 0.9 * average + 0.1 * instantaneous`, starting from 0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FpsEstimator {
    average: f64,
    last_instant: f64,
    samples: u64,
}

impl FpsEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed frame that took `interval` since the previous one.
    ///
    /// A zero interval carries no rate information and is ignored.
    pub fn record_interval(&mut self, interval: Duration) {
        let secs = interval.as_secs_f64();
        if secs <= 0.0 {
            return;
        }
        self.record_rate(1.0 / secs);
    }

    /// Records one instantaneous frame-rate sample.
    pub fn record_rate(&mut self, fps: f64) {
        self.last_instant = fps;
        self.average = SMOOTHING * self.average + (1.0 - SMOOTHING) * fps;
        self.samples += 1;
    }

    /// The smoothed rate.
    pub fn average(&self) -> f64 {
        self.average
    }

    /// The most recent instantaneous rate.
    pub fn instantaneous(&self) -> f64 {
        self.last_instant
    }

    /// Number of samples recorded so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_contributes_ten_percent() {
        let mut fps = FpsEstimator::new();
        fps.record_rate(60.0);
        assert!((fps.average() - 6.0).abs() < 1e-9);
        assert_eq!(fps.instantaneous(), 60.0);
    }

    #[test]
    fn test_constant_one_second_interval_converges_to_one() {
        // Arrange
        let mut fps = FpsEstimator::new();

        // Act
        for _ in 0..300 {
            fps.record_interval(Duration::from_secs(1));
        }

        // Assert
        assert!((fps.average() - 1.0).abs() < 1e-6, "got {}", fps.average());
        assert_eq!(fps.samples(), 300);
    }

    #[test]
    fn test_zero_interval_is_ignored() {
        let mut fps = FpsEstimator::new();
        fps.record_interval(Duration::ZERO);
        assert_eq!(fps.samples(), 0);
        assert_eq!(fps.average(), 0.0);
    }
}
