//! The funnel itself: step catalog, answers, scoring, and the engine.

pub mod answers;
pub mod catalog;
pub mod engine;
pub mod scoring;

pub use answers::{AnswerSet, AnswerValue};
pub use catalog::{ChoiceOption, StepCatalog, StepDefinition, StepKind};
pub use engine::{Answered, FunnelEngine, FunnelPhase, FunnelState};
pub use scoring::{badge_for, points_for, Badge, ScoreState};
