use clap::Subcommand;

use alivio_core::storage::{Config, Database};
use alivio_core::PendingQueue;

use crate::common;

#[derive(Subcommand)]
pub enum EventsAction {
    /// List analytics events waiting for delivery
    Pending,
    /// Replay the pending queue against the configured collector
    Flush,
}

pub fn run(action: EventsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        EventsAction::Pending => {
            let mut queue = PendingQueue::new();
            queue.load()?;
            if queue.is_empty() {
                println!("no pending events");
                return Ok(());
            }
            println!("{} pending event(s):", queue.len());
            for event in queue.events() {
                println!(
                    "  {}  {}",
                    event.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    event.event_name
                );
            }
        }
        EventsAction::Flush => {
            let config = Config::load_or_default();
            let db = Database::open()?;
            let mut reporter = common::build_reporter(&config, &db)?;
            let delivered = reporter.flush_pending();
            println!(
                "delivered {delivered} event(s), {} still queued",
                reporter.pending_len()
            );
            db.kv_set(
                common::TELEMETRY_KEY,
                &serde_json::to_string(reporter.telemetry())?,
            )?;
        }
    }
    Ok(())
}
