//! Gamification scoring tables.
//!
//! Pure lookups with no state of their own: the same step id always yields
//! the same point value and badge. The running `ScoreState` is owned by the
//! engine and only ever grows.

use serde::{Deserialize, Serialize};

/// A one-time-awardable achievement tied to answering a specific step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub label: String,
}

impl Badge {
    fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Points awarded for answering a step. Fixed, distinct, positive.
pub fn points_for(step_id: &str) -> u32 {
    match step_id {
        "age" => 15,
        "pain_level" => 20,
        "main_problem" => 25,
        "duration" => 20,
        "previous_treatment" => 30,
        "email" => 35,
        "lifestyle" => 25,
        "time_available" => 30,
        "investment" => 40,
        _ => 0,
    }
}

/// Badge unlocked by answering a step, if any.
pub fn badge_for(step_id: &str) -> Option<Badge> {
    let badge = match step_id {
        "age" => Badge::new("profile-identified", "🎯 Profile identified"),
        "pain_level" => Badge::new("pain-mapped", "📊 Pain mapped"),
        "main_problem" => Badge::new("problem-located", "🔍 Problem located"),
        "duration" => Badge::new("history-reviewed", "⏰ History reviewed"),
        "previous_treatment" => Badge::new("experience-assessed", "💡 Experience assessed"),
        "email" => Badge::new("system-connected", "📧 Connected to the system"),
        "lifestyle" => Badge::new("routine-mapped", "🏢 Routine mapped"),
        "time_available" => Badge::new("availability-set", "⚡ Availability set"),
        "investment" => Badge::new("assessment-complete", "👑 Assessment complete"),
        _ => return None,
    };
    Some(badge)
}

/// Running score for one session. Points only ever increase; badges are
/// appended in unlock order and never duplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    points: u32,
    badges: Vec<Badge>,
}

impl ScoreState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.iter().any(|b| b.id == badge_id)
    }

    /// Apply the scoring tables for `step_id`. Returns the badge if it was
    /// unlocked just now (already-held badges are not appended again).
    pub fn award(&mut self, step_id: &str) -> Option<Badge> {
        self.points += points_for(step_id);
        let badge = badge_for(step_id)?;
        if self.has_badge(&badge.id) {
            return None;
        }
        self.badges.push(badge.clone());
        Some(badge)
    }
}
