use std::collections::VecDeque;

use super::models::PredictionResult;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Bounded FIFO of accepted prediction results
#[derive(Debug, Clone)]
pub struct PredictionHistory {
    entries: VecDeque<PredictionResult>,
    capacity: usize,
}

impl PredictionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a result, evicting the oldest entries past capacity
    pub fn push(&mut self, result: PredictionResult) {
        self.entries.push_back(result);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Oldest-first iterator over the last `window` entries
    pub fn recent(&self, window: usize) -> impl Iterator<Item = &PredictionResult> {
        let skip = self.entries.len().saturating_sub(window);
        self.entries.iter().skip(skip)
    }

    /// Number of algorithm keys in `result` whose `priority_numbers` exactly
    /// match the same key in any of the last `window` entries.
    ///
    /// Each key counts at most once, however many entries it matches.
    pub fn count_duplicate_algorithms(&self, result: &PredictionResult, window: usize) -> usize {
        result
            .iter()
            .filter(|(key, current)| {
                self.recent(window).any(|past| {
                    past.get(*key)
                        .is_some_and(|previous| previous.priority_numbers == current.priority_numbers)
                })
            })
            .count()
    }
}

impl Default for PredictionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
