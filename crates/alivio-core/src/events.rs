use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::funnel::engine::FunnelPhase;
use crate::funnel::scoring::Badge;

/// Every state change in the funnel produces an Event.
/// The presentation layer polls for events; it holds no logic of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: String,
        at: DateTime<Utc>,
    },
    AnswerRecorded {
        step_id: String,
        points_awarded: u32,
        total_points: u32,
        progress_pct: u32,
        at: DateTime<Utc>,
    },
    /// A badge was unlocked just now; the renderer owns the celebratory
    /// animation's lifecycle end to end.
    CelebrationRequested {
        badge: Badge,
        at: DateTime<Utc>,
    },
    StepEntered {
        step_index: usize,
        step_id: String,
        at: DateTime<Utc>,
    },
    AnalysisStarted {
        at: DateTime<Utc>,
    },
    AnalysisAdvanced {
        tick: usize,
        total_ticks: usize,
        at: DateTime<Utc>,
    },
    LoadingStarted {
        at: DateTime<Utc>,
    },
    /// The funnel reached its terminal phase.
    Completed {
        points: u32,
        badge_count: usize,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: FunnelPhase,
        points: u32,
        badge_count: usize,
        progress_pct: u32,
        at: DateTime<Utc>,
    },
}
