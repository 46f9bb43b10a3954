//! Durable queue for analytics events that failed live delivery.
//!
//! The queue is the only persisted shared resource in the system. It is
//! read-modify-written as a single unit (load full list, mutate, store full
//! list); there is one writer per session, and a multi-tab/multi-host race
//! is an accepted limitation.

use std::path::PathBuf;

use crate::storage::data_dir;
use crate::tracking::events::TrackEvent;

/// FIFO queue of undelivered events, persisted as a JSON array.
pub struct PendingQueue {
    events: Vec<TrackEvent>,
    queue_file: PathBuf,
}

impl PendingQueue {
    /// Create a queue backed by the default data directory.
    pub fn new() -> Self {
        let dir = data_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_path(dir.join("pending_events.json"))
    }

    /// Create a queue backed by a specific file (for testing).
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            events: Vec::new(),
            queue_file: path,
        }
    }

    /// Append an event, preserving enqueue order.
    pub fn push(&mut self, event: TrackEvent) {
        self.events.push(event);
    }

    /// Take every queued event, oldest first, leaving the queue empty
    /// in memory. Call `persist` to make the removal durable.
    pub fn drain_all(&mut self) -> Vec<TrackEvent> {
        std::mem::take(&mut self.events)
    }

    /// Put undelivered events back at the front, keeping their order.
    pub fn requeue_front(&mut self, mut events: Vec<TrackEvent>) {
        events.append(&mut self.events);
        self.events = events;
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[TrackEvent] {
        &self.events
    }

    /// Persist the queue to disk.
    pub fn persist(&self) -> Result<(), std::io::Error> {
        let data = serde_json::to_string_pretty(&self.events)?;
        std::fs::write(&self.queue_file, data)?;
        Ok(())
    }

    /// Load the queue from disk. A missing file is an empty queue.
    pub fn load(&mut self) -> Result<(), std::io::Error> {
        if !self.queue_file.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(&self.queue_file)?;
        let loaded: Vec<TrackEvent> = serde_json::from_str(&content)?;
        self.events = loaded;
        Ok(())
    }
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new()
    }
}
