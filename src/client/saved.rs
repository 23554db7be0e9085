//! In-memory book of number sets the user chose to keep

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::models::{NumbersError, PICK_SIZE, validate_user_numbers};

/// Numbers at or below this count as "low"
const LOW_HIGH_SPLIT: u8 = 22;

/// Simple shape summary stored alongside a saved set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberAnalysis {
    pub sum: u32,
    pub odd: u8,
    pub even: u8,
    pub low: u8,
    pub high: u8,
}

impl NumberAnalysis {
    pub fn of(numbers: &[u8; PICK_SIZE]) -> Self {
        let odd = numbers.iter().filter(|n| *n % 2 == 1).count() as u8;
        let low = numbers.iter().filter(|n| **n <= LOW_HIGH_SPLIT).count() as u8;
        Self {
            sum: numbers.iter().map(|n| *n as u32).sum(),
            odd,
            even: PICK_SIZE as u8 - odd,
            low,
            high: PICK_SIZE as u8 - low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedNumberEntry {
    pub id: String,
    /// Sorted ascending
    pub numbers: [u8; PICK_SIZE],
    pub label: String,
    pub saved_at: DateTime<Utc>,
    pub analysis: NumberAnalysis,
}

#[derive(Debug, Default)]
pub struct SavedNumbers {
    entries: Vec<SavedNumberEntry>,
}

impl SavedNumbers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a set of exactly six numbers; an empty selection is rejected
    pub fn save(&mut self, numbers: &[u8], label: &str) -> Result<SavedNumberEntry, NumbersError> {
        validate_user_numbers(numbers)?;
        let mut sorted: [u8; PICK_SIZE] = numbers
            .try_into()
            .map_err(|_| NumbersError::WrongCount(numbers.len()))?;
        sorted.sort_unstable();

        let entry = SavedNumberEntry {
            id: Uuid::now_v7().to_string(),
            numbers: sorted,
            label: label.to_string(),
            saved_at: Utc::now(),
            analysis: NumberAnalysis::of(&sorted),
        };

        self.entries.push(entry.clone());
        Ok(entry)
    }

    pub fn remove(&mut self, id: &str) -> Option<SavedNumberEntry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Oldest first
    pub fn list(&self) -> &[SavedNumberEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
