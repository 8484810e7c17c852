//! Bounded history of prediction results
//!
//! Most recent first. Appending at capacity evicts the oldest entry.

use crate::models::PredictionResult;
use chrono::Local;
use serde::Serialize;
use std::collections::VecDeque;

/// Number of results kept by default
pub const HISTORY_CAPACITY: usize = 10;

/// A stored prediction with its display time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub display_time: String,
}

impl HistoryEntry {
    fn new(result: PredictionResult) -> Self {
        let display_time = result
            .observed_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string();
        Self {
            result,
            display_time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// A zero capacity is bumped to one
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, result: PredictionResult) {
        self.entries.push_front(HistoryEntry::new(result));
        self.entries.truncate(self.capacity);
    }

    /// Most recent entry
    pub fn head(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    /// Entries, most recent first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
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
}
