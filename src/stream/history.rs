//! Bounded log of received stream messages.
//!
//! Newest entries come first. Once the log is full the oldest entry is
//! dropped for every new one.

use crate::config::DEFAULT_EVENT_LOG_CAPACITY;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;

/// One received message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLogEntry {
    /// Unique per received message
    pub id: String,
    pub received_at: DateTime<Utc>,
    pub payload: Value,
}

impl EventLogEntry {
    pub fn new(payload: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            received_at: Utc::now(),
            payload,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<EventLogEntry>,
    capacity: usize,
}

impl EventLog {
    /// Create a log holding at most `capacity` entries.
    ///
    /// 0 means the default; anything above [`DEFAULT_EVENT_LOG_CAPACITY`] is
    /// clamped down to it.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = match capacity {
            0 => DEFAULT_EVENT_LOG_CAPACITY,
            n => n.min(DEFAULT_EVENT_LOG_CAPACITY),
        };
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a payload as the newest entry.
    pub fn push(&mut self, payload: Value) -> &EventLogEntry {
        self.push_entry(EventLogEntry::new(payload))
    }

    pub fn push_entry(&mut self, entry: EventLogEntry) -> &EventLogEntry {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
        &self.entries[0]
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &EventLogEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&EventLogEntry> {
        self.entries.front()
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
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_LOG_CAPACITY)
    }
}
