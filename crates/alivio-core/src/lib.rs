//! # Alivio Core Library
//!
//! This library provides the core business logic for the Alivio lead
//! funnel: a multi-step pain assessment that collects a user profile,
//! computes a gamified score, captures an email as a lead, and ends on a
//! personalized offer. It implements a CLI-first philosophy where all
//! operations are available via a standalone CLI binary; any GUI is a thin
//! presentation layer polling the same core.
//!
//! ## Architecture
//!
//! - **Funnel Engine**: A wall-clock-based state machine that requires the
//!   caller to periodically invoke `tick()` to drive pacing, the mid-quiz
//!   analysis detour, and the loading phase
//! - **Tracking**: Best-effort analytics delivery with a single delayed
//!   retry and a durable FIFO fallback queue
//! - **Leads**: The two lead-store operations this core consumes (existence
//!   check, insert) behind a trait seam
//! - **Storage**: SQLite host storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`FunnelEngine`]: Core funnel state machine
//! - [`StepCatalog`]: The ordered question sequence
//! - [`EventReporter`]: Analytics delivery with local fallback
//! - [`LeadStore`]: Trait for the external lead persistence service
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod funnel;
pub mod leads;
pub mod offer;
pub mod results;
pub mod storage;
pub mod telemetry;
pub mod tracking;

pub use error::{AnswerError, ConfigError, CoreError, DatabaseError, StoreError, TrackError};
pub use events::Event;
pub use funnel::{
    Answered, AnswerSet, AnswerValue, Badge, FunnelEngine, FunnelPhase, FunnelState, ScoreState,
    StepCatalog, StepDefinition, StepKind,
};
pub use leads::{HttpLeadStore, LeadRecord, LeadStore};
pub use offer::{Offer, OfferCountdown};
pub use results::{ResultsProfile, SocialProof};
pub use storage::{Config, Database};
pub use telemetry::SessionTelemetry;
pub use tracking::{Collector, EventReporter, HttpCollector, PendingQueue, TrackEvent};
