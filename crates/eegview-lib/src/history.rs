use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

pub const HISTORY_COLUMNS: [&str; 3] = ["TIMESTAMP", "EVENT", "STATUS"];

const DEFAULT_CAPACITY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryStatus {
    Success,
    Failed,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Success => write!(f, "Success"),
            EntryStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub event: String,
    pub status: EntryStatus,
}

impl HistoryEntry {
    /// Table cells in `HISTORY_COLUMNS` order.
    pub fn cells(&self) -> [String; 3] {
        [
            self.timestamp.format("%H:%M:%S").to_string(),
            self.event.clone(),
            self.status.to_string(),
        ]
    }
}

/// In-memory session log shown in the history table. Oldest entries are
/// dropped once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push_at(&mut self, timestamp: DateTime<Local>, event: impl Into<String>, status: EntryStatus) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            timestamp,
            event: event.into(),
            status,
        });
    }

    pub fn success(&mut self, event: impl Into<String>) {
        self.push_at(Local::now(), event, EntryStatus::Success);
    }

    pub fn failure(&mut self, event: impl Into<String>) {
        self.push_at(Local::now(), event, EntryStatus::Failed);
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    pub fn rows(&self) -> Vec<[String; 3]> {
        self.entries.iter().map(HistoryEntry::cells).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
