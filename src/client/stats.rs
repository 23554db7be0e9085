use serde::Serialize;

/// Session counters for the reliability client.
///
/// `forced_refreshes` and `duplicate_detections` never exceed `total_requests`;
/// only [`RandomnessStats::reset`] moves any counter backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RandomnessStats {
    pub total_requests: u64,
    pub forced_refreshes: u64,
    pub unique_results: u64,
    pub duplicate_detections: u64,
}

impl RandomnessStats {
    pub fn record_request(&mut self) {
        self.total_requests += 1;
    }

    pub fn record_forced_refresh(&mut self) {
        self.forced_refreshes += 1;
    }

    pub fn record_unique(&mut self) {
        self.unique_results += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicate_detections += 1;
    }

    /// Share of requests that produced a fresh result, in percent
    pub fn uniqueness_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.unique_results as f64 / self.total_requests as f64 * 100.0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_rate() {
        let mut stats = RandomnessStats::default();
        assert_eq!(stats.uniqueness_rate(), 0.0);

        for _ in 0..4 {
            stats.record_request();
        }
        stats.record_unique();
        stats.record_unique();
        stats.record_unique();
        stats.record_duplicate();
        stats.record_forced_refresh();

        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.uniqueness_rate(), 75.0);
        assert!(stats.forced_refreshes <= stats.total_requests);
        assert!(stats.duplicate_detections <= stats.total_requests);
    }

    #[test]
    fn test_reset() {
        let mut stats = RandomnessStats::default();
        stats.record_request();
        stats.record_duplicate();

        stats.reset();
        assert_eq!(stats, RandomnessStats::default());
    }
}
