//! Best-effort analytics: event vocabulary, durable fallback queue,
//! reporter, and the HTTP collector.

pub mod events;
pub mod pending;
pub mod pixel;
pub mod reporter;

pub use events::TrackEvent;
pub use pending::PendingQueue;
pub use pixel::HttpCollector;
pub use reporter::{Collector, EventReporter};
