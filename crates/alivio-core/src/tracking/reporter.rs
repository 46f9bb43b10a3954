//! Best-effort analytics delivery.
//!
//! The reporter never blocks or fails the primary flow. A failed emission
//! is retried exactly once after a fixed delay (the retry fires on a later
//! `tick()`, keeping everything caller-driven); if the retry also fails the
//! event lands in the durable pending queue and is replayed FIFO by the
//! next `flush_pending`. Delivery is at-least-once; duplicates are an
//! accepted tradeoff for analytics data.

use tracing::{debug, warn};

use crate::error::TrackError;
use crate::telemetry::SessionTelemetry;
use crate::tracking::events::TrackEvent;
use crate::tracking::pending::PendingQueue;

/// Seam to the external analytics collector.
pub trait Collector: Send {
    /// Unique identifier (e.g. "pixel", "console").
    fn name(&self) -> &str;

    /// Whether the collector handle is available right now.
    fn is_ready(&self) -> bool;

    /// Deliver a single event.
    fn deliver(&self, event: &TrackEvent) -> Result<(), TrackError>;
}

struct RetrySlot {
    event: TrackEvent,
    due_epoch_ms: u64,
}

pub struct EventReporter {
    collector: Box<dyn Collector>,
    queue: PendingQueue,
    telemetry: SessionTelemetry,
    retry_delay_ms: u64,
    retries: Vec<RetrySlot>,
}

impl EventReporter {
    /// Build a reporter over the default queue location. Queued events from
    /// earlier sessions are loaded so `flush_pending` can replay them.
    pub fn new(collector: Box<dyn Collector>, telemetry: SessionTelemetry, retry_delay_ms: u64) -> Self {
        let mut queue = PendingQueue::new();
        if let Err(e) = queue.load() {
            warn!(error = %e, "failed to load pending event queue");
        }
        Self::with_queue(collector, telemetry, retry_delay_ms, queue)
    }

    /// Build a reporter over a specific queue (for testing).
    pub fn with_queue(
        collector: Box<dyn Collector>,
        telemetry: SessionTelemetry,
        retry_delay_ms: u64,
        queue: PendingQueue,
    ) -> Self {
        Self {
            collector,
            queue,
            telemetry,
            retry_delay_ms,
            retries: Vec::new(),
        }
    }

    pub fn telemetry(&self) -> &SessionTelemetry {
        &self.telemetry
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Attempt immediate delivery; on failure schedule the single retry.
    /// Never surfaces an error to the caller.
    pub fn emit(&mut self, mut event: TrackEvent) {
        if self.telemetry.is_disposed() {
            warn!(event = %event.event_name, "emit after dispose ignored");
            return;
        }
        self.telemetry.stamp(&mut event);
        self.telemetry.note_emitted();

        match self.try_deliver(&event) {
            Ok(()) => debug!(event = %event.event_name, "event delivered"),
            Err(e) => {
                debug!(event = %event.event_name, error = %e, "scheduling single retry");
                self.retries.push(RetrySlot {
                    due_epoch_ms: now_ms() + self.retry_delay_ms,
                    event,
                });
            }
        }
    }

    /// Drive due retries. Events whose retry also fails move to the durable
    /// queue. Call periodically, e.g. from the engine's tick loop.
    pub fn tick(&mut self) {
        if self.retries.is_empty() {
            return;
        }
        let now = now_ms();
        let mut remaining = Vec::with_capacity(self.retries.len());
        let mut queued_any = false;
        for slot in self.retries.drain(..) {
            if slot.due_epoch_ms > now {
                remaining.push(slot);
                continue;
            }
            match self.collector.is_ready() {
                true => match self.collector.deliver(&slot.event) {
                    Ok(()) => debug!(event = %slot.event.event_name, "retry delivered"),
                    Err(e) => {
                        warn!(event = %slot.event.event_name, error = %e, "retry failed, queueing");
                        self.queue.push(slot.event);
                        self.telemetry.note_queued();
                        queued_any = true;
                    }
                },
                false => {
                    self.queue.push(slot.event);
                    self.telemetry.note_queued();
                    queued_any = true;
                }
            }
        }
        self.retries = remaining;
        if queued_any {
            self.persist_queue();
        }
    }

    /// Replay every queued event in enqueue order and clear the delivered
    /// ones. Invoked once near session start. If the collector is still
    /// unavailable the queue is left untouched; there is no retry loop
    /// within a single flush. Returns the number of delivered events.
    pub fn flush_pending(&mut self) -> usize {
        if self.queue.is_empty() || !self.collector.is_ready() {
            return 0;
        }

        let mut delivered = 0usize;
        let mut failed = Vec::new();
        for event in self.queue.drain_all() {
            match self.collector.deliver(&event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(event = %event.event_name, error = %e, "flush delivery failed");
                    failed.push(event);
                }
            }
        }
        self.queue.requeue_front(failed);
        self.persist_queue();
        debug!(delivered, remaining = self.queue.len(), "pending flush finished");
        delivered
    }

    /// Spill unresolved retries to the durable queue, e.g. when the host is
    /// about to exit before the retry delay elapses. The session stays open.
    pub fn flush_retries_to_queue(&mut self) {
        let mut queued_any = false;
        for slot in self.retries.drain(..) {
            self.queue.push(slot.event);
            self.telemetry.note_queued();
            queued_any = true;
        }
        if queued_any {
            self.persist_queue();
        }
    }

    /// End-of-session teardown: spill unresolved retries to the durable
    /// queue and dispose the telemetry so late emissions become no-ops.
    pub fn dispose(&mut self) {
        self.flush_retries_to_queue();
        self.telemetry.dispose();
    }

    fn try_deliver(&self, event: &TrackEvent) -> Result<(), TrackError> {
        if !self.collector.is_ready() {
            return Err(TrackError::NotReady);
        }
        self.collector.deliver(event)
    }

    fn persist_queue(&self) {
        if let Err(e) = self.queue.persist() {
            warn!(error = %e, "failed to persist pending event queue");
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
