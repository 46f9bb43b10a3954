//! Funnel engine implementation.
//!
//! The engine is a wall-clock-based state machine. It does not use internal
//! threads - the caller is responsible for calling `tick()` periodically to
//! drive the pacing delay, the mid-quiz analysis detour, and the loading
//! phase.
//!
//! ## Phase transitions
//!
//! ```text
//! Asking(0) -> .. -> Asking(checkpoint) -> MidAnalysis -> Asking(resume)
//!           -> .. -> Asking(last) -> Loading -> Results
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = FunnelEngine::new(catalog, reporter, leads, flow, price)?;
//! engine.start();
//! engine.record_answer("age", "45-54".into())?;
//! // In a loop:
//! engine.tick(); // Returns Some(Event) when a transition fires
//! ```

use std::collections::VecDeque;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AnswerError, ConfigError, StoreError};
use crate::events::Event;
use crate::funnel::answers::{AnswerSet, AnswerValue};
use crate::funnel::catalog::{StepCatalog, StepDefinition, StepKind};
use crate::funnel::scoring::{self, Badge, ScoreState};
use crate::leads::{LeadRecord, LeadStore};
use crate::storage::config::FlowConfig;
use crate::tracking::events as track;
use crate::tracking::reporter::EventReporter;

/// Exactly one phase is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum FunnelPhase {
    Asking { step_index: usize },
    MidAnalysis { tick: usize },
    Loading,
    Results,
}

/// What happens when the scheduled transition falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Transition {
    AdvanceTo { step_index: usize },
    EnterAnalysis,
    AnalysisTick,
    ExitAnalysis,
    EnterLoading,
    FinishLoading,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PendingTransition {
    due_epoch_ms: u64,
    transition: Transition,
}

/// The serializable part of the engine. Hosts persist this between
/// invocations and rebuild the engine around it with fresh collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunnelState {
    phase: FunnelPhase,
    answers: AnswerSet,
    score: ScoreState,
    started: bool,
    #[serde(default)]
    pending: Option<PendingTransition>,
}

impl FunnelState {
    pub fn phase(&self) -> FunnelPhase {
        self.phase
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn score(&self) -> &ScoreState {
        &self.score
    }
}

impl Default for FunnelState {
    fn default() -> Self {
        Self {
            phase: FunnelPhase::Asking { step_index: 0 },
            answers: AnswerSet::new(),
            score: ScoreState::new(),
            started: false,
            pending: None,
        }
    }
}

/// Caller-visible result of an accepted answer.
#[derive(Debug, Clone, Serialize)]
pub struct Answered {
    pub step_id: String,
    pub points_awarded: u32,
    pub total_points: u32,
    pub badge: Option<Badge>,
    pub progress_pct: u32,
}

/// Core funnel engine.
///
/// Owns the interaction lifecycle and mediates between answers and the
/// side-effecting collaborators. Operates on wall-clock deltas -- no
/// internal thread.
pub struct FunnelEngine {
    catalog: StepCatalog,
    flow: FlowConfig,
    /// Monetary value attached to the email-capture event.
    lead_value: f64,
    state: FunnelState,
    reporter: EventReporter,
    leads: Box<dyn LeadStore>,
    events: VecDeque<Event>,
}

impl FunnelEngine {
    /// Create an engine for a fresh session.
    pub fn new(
        catalog: StepCatalog,
        reporter: EventReporter,
        leads: Box<dyn LeadStore>,
        flow: FlowConfig,
        lead_value: f64,
    ) -> Result<Self, ConfigError> {
        Self::resume(FunnelState::default(), catalog, reporter, leads, flow, lead_value)
    }

    /// Rebuild an engine around persisted state.
    pub fn resume(
        state: FunnelState,
        catalog: StepCatalog,
        reporter: EventReporter,
        leads: Box<dyn LeadStore>,
        flow: FlowConfig,
        lead_value: f64,
    ) -> Result<Self, ConfigError> {
        if catalog.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "catalog".into(),
                message: "step catalog is empty".into(),
            });
        }
        if flow.resume_index >= catalog.len() {
            return Err(ConfigError::InvalidValue {
                key: "flow.resume_index".into(),
                message: format!(
                    "index {} out of bounds for a {}-step catalog",
                    flow.resume_index,
                    catalog.len()
                ),
            });
        }
        if catalog.index_of(catalog.checkpoint_id()).is_none() {
            return Err(ConfigError::InvalidValue {
                key: "catalog.checkpoint_id".into(),
                message: format!("unknown step '{}'", catalog.checkpoint_id()),
            });
        }
        Ok(Self {
            catalog,
            flow,
            lead_value,
            state,
            reporter,
            leads,
            events: VecDeque::new(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> FunnelPhase {
        self.state.phase
    }

    pub fn state(&self) -> &FunnelState {
        &self.state
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.state.answers
    }

    pub fn score(&self) -> &ScoreState {
        &self.state.score
    }

    pub fn current_step(&self) -> Option<&StepDefinition> {
        match self.state.phase {
            FunnelPhase::Asking { step_index } => self.catalog.step_at(step_index),
            _ => None,
        }
    }

    /// Whether no transition is scheduled right now.
    pub fn is_settled(&self) -> bool {
        self.state.pending.is_none()
    }

    pub fn telemetry(&self) -> &crate::telemetry::SessionTelemetry {
        self.reporter.telemetry()
    }

    /// 0..=100 share of answered steps.
    pub fn progress_pct(&self) -> u32 {
        let total = self.catalog.len();
        if total == 0 {
            return 0;
        }
        let answered = self.state.answers.answered_count();
        ((answered as f64 / total as f64) * 100.0).round() as u32
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.state.phase,
            points: self.state.score.points(),
            badge_count: self.state.score.badges().len(),
            progress_pct: self.progress_pct(),
            at: Utc::now(),
        }
    }

    /// Drain events produced since the last call. The presentation layer
    /// consumes these; the engine never renders anything itself.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Idempotent session start: replays the pending analytics queue once
    /// and emits the session-start tracking event.
    pub fn start(&mut self) -> Option<Event> {
        if self.state.started {
            return None;
        }
        self.state.started = true;

        let flushed = self.reporter.flush_pending();
        if flushed > 0 {
            debug!(flushed, "replayed queued analytics events");
        }
        self.reporter.emit(track::quiz_start());

        let event = Event::SessionStarted {
            session_id: self.reporter.telemetry().session_id().to_string(),
            at: Utc::now(),
        };
        self.events.push_back(event.clone());
        Some(event)
    }

    /// Record the answer for the currently active step.
    ///
    /// Rejections leave the engine untouched: no answer is stored, no score
    /// changes, no event is emitted. The returned error is the inline
    /// feedback for the user; it never needs to propagate further.
    pub fn record_answer(
        &mut self,
        step_id: &str,
        value: AnswerValue,
    ) -> Result<Answered, AnswerError> {
        let step_index = match self.state.phase {
            FunnelPhase::Asking { step_index } => step_index,
            _ => return Err(AnswerError::NotAsking),
        };
        if self.state.pending.is_some() {
            // A stale control re-submitted while the transition is in flight.
            return Err(AnswerError::TransitionPending);
        }
        let step = self
            .catalog
            .step_at(step_index)
            .ok_or(AnswerError::NotAsking)?;
        if step.id != step_id {
            return Err(AnswerError::UnexpectedStep {
                expected: step.id.clone(),
                got: step_id.to_string(),
            });
        }

        let value = Self::validate(step, value)?;
        let step = step.clone();

        if step.kind == StepKind::Email {
            let email = value.as_text().unwrap_or_default().to_string();
            self.gate_email(&step.id, &email)?;
        }

        // Accepted: store the answer, then score it.
        self.state.answers.record(&step.id, value);
        let points_awarded = scoring::points_for(&step.id);
        let badge = self.state.score.award(&step.id);
        if let Some(ref badge) = badge {
            self.events.push_back(Event::CelebrationRequested {
                badge: badge.clone(),
                at: Utc::now(),
            });
        }

        let progress_pct = self.progress_pct();
        if step.kind == StepKind::Email {
            self.reporter.emit(track::email_captured(self.lead_value));
        }
        self.reporter.emit(track::progress_update(progress_pct));

        let transition = self.decide_transition(step_index, &step);
        self.schedule(transition, self.flow.advance_delay_ms);

        let answered = Answered {
            step_id: step.id.clone(),
            points_awarded,
            total_points: self.state.score.points(),
            badge,
            progress_pct,
        };
        self.events.push_back(Event::AnswerRecorded {
            step_id: step.id,
            points_awarded,
            total_points: answered.total_points,
            progress_pct,
            at: Utc::now(),
        });
        Ok(answered)
    }

    /// Call periodically. Applies at most one due transition per call and
    /// returns the event it produced.
    pub fn tick(&mut self) -> Option<Event> {
        self.reporter.tick();

        let pending = self.state.pending?;
        if now_ms() < pending.due_epoch_ms {
            return None;
        }
        self.state.pending = None;
        self.apply(pending.transition)
    }

    /// Jump straight to the terminal phase, emitting the completion event
    /// exactly once.
    pub fn force_complete(&mut self) -> Option<Event> {
        self.complete()
    }

    /// Persist-and-exit path for hosts: spill unresolved analytics retries
    /// to the durable queue and hand back the state without ending the
    /// session. A later `resume` continues where this left off.
    pub fn suspend(mut self) -> FunnelState {
        self.reporter.flush_retries_to_queue();
        self.state
    }

    /// Tear the engine down: spill unresolved analytics retries to the
    /// durable queue, dispose the telemetry, and return the final state.
    pub fn shutdown(mut self) -> FunnelState {
        self.reporter.dispose();
        self.state
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn validate(step: &StepDefinition, value: AnswerValue) -> Result<AnswerValue, AnswerError> {
        match step.kind {
            StepKind::Slider => match value {
                AnswerValue::Scale(v) if v <= 10 => Ok(AnswerValue::Scale(v)),
                AnswerValue::Scale(v) => Err(AnswerError::SliderOutOfRange { value: v as i64 }),
                AnswerValue::Text(_) => Err(AnswerError::KindMismatch {
                    step_id: step.id.clone(),
                }),
            },
            StepKind::Choice => match value {
                AnswerValue::Text(ref v) if step.has_option(v) => Ok(value),
                AnswerValue::Text(v) => Err(AnswerError::InvalidChoice {
                    step_id: step.id.clone(),
                    value: v,
                }),
                AnswerValue::Scale(_) => Err(AnswerError::KindMismatch {
                    step_id: step.id.clone(),
                }),
            },
            StepKind::Email => match value {
                AnswerValue::Text(v) => {
                    let trimmed = v.trim();
                    if trimmed.is_empty() || !trimmed.contains('@') {
                        return Err(AnswerError::InvalidEmail);
                    }
                    Ok(AnswerValue::Text(trimmed.to_string()))
                }
                AnswerValue::Scale(_) => Err(AnswerError::KindMismatch {
                    step_id: step.id.clone(),
                }),
            },
        }
    }

    /// The two-phase lead gate: advisory existence check, then insert.
    /// The only place where advancement depends on external success.
    fn gate_email(&mut self, step_id: &str, email: &str) -> Result<(), AnswerError> {
        match self.leads.exists_by_email(email) {
            Ok(true) => return Err(AnswerError::DuplicateEmail),
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "lead existence check failed");
                return Err(AnswerError::StoreUnavailable(e));
            }
        }

        let user_score = self.state.score.points() + scoring::points_for(step_id);
        let record = LeadRecord::from_answers(email, &self.state.answers, user_score);
        match self.leads.insert(&record) {
            Ok(_) => Ok(()),
            Err(StoreError::DuplicateEmail) => Err(AnswerError::DuplicateEmail),
            Err(e) => {
                warn!(error = %e, "lead insert failed");
                Err(AnswerError::StoreUnavailable(e))
            }
        }
    }

    fn decide_transition(&self, step_index: usize, step: &StepDefinition) -> Transition {
        if step.id == self.catalog.checkpoint_id() {
            Transition::EnterAnalysis
        } else if self.catalog.step_at(step_index + 1).is_none() {
            Transition::EnterLoading
        } else {
            Transition::AdvanceTo {
                step_index: step_index + 1,
            }
        }
    }

    fn schedule(&mut self, transition: Transition, delay_ms: u64) {
        self.state.pending = Some(PendingTransition {
            due_epoch_ms: now_ms() + delay_ms,
            transition,
        });
    }

    fn apply(&mut self, transition: Transition) -> Option<Event> {
        let event = match transition {
            Transition::AdvanceTo { step_index } => {
                self.state.phase = FunnelPhase::Asking { step_index };
                let step = self.catalog.step_at(step_index)?;
                Event::StepEntered {
                    step_index,
                    step_id: step.id.clone(),
                    at: Utc::now(),
                }
            }
            Transition::EnterAnalysis => {
                self.state.phase = FunnelPhase::MidAnalysis { tick: 0 };
                self.schedule(Transition::AnalysisTick, self.flow.analysis_tick_ms);
                Event::AnalysisStarted { at: Utc::now() }
            }
            Transition::AnalysisTick => {
                let tick = match self.state.phase {
                    FunnelPhase::MidAnalysis { tick } => tick,
                    _ => return None,
                };
                let next = tick + 1;
                self.state.phase = FunnelPhase::MidAnalysis { tick: next };
                if next + 1 >= self.flow.analysis_ticks {
                    self.schedule(Transition::ExitAnalysis, self.flow.analysis_exit_ms);
                } else {
                    self.schedule(Transition::AnalysisTick, self.flow.analysis_tick_ms);
                }
                Event::AnalysisAdvanced {
                    tick: next,
                    total_ticks: self.flow.analysis_ticks,
                    at: Utc::now(),
                }
            }
            Transition::ExitAnalysis => {
                let step_index = self.flow.resume_index;
                self.state.phase = FunnelPhase::Asking { step_index };
                let step = self.catalog.step_at(step_index)?;
                Event::StepEntered {
                    step_index,
                    step_id: step.id.clone(),
                    at: Utc::now(),
                }
            }
            Transition::EnterLoading => {
                self.state.phase = FunnelPhase::Loading;
                self.schedule(Transition::FinishLoading, self.flow.loading_ms);
                Event::LoadingStarted { at: Utc::now() }
            }
            Transition::FinishLoading => return self.complete(),
        };
        self.events.push_back(event.clone());
        Some(event)
    }

    fn complete(&mut self) -> Option<Event> {
        if self.state.phase == FunnelPhase::Results {
            return None;
        }
        self.state.phase = FunnelPhase::Results;
        self.state.pending = None;
        self.reporter
            .emit(track::quiz_complete(self.state.score.points()));

        let event = Event::Completed {
            points: self.state.score.points(),
            badge_count: self.state.score.badges().len(),
            at: Utc::now(),
        };
        self.events.push_back(event.clone());
        Some(event)
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackError;
    use crate::telemetry::SessionTelemetry;
    use crate::tracking::events::TrackEvent;
    use crate::tracking::pending::PendingQueue;
    use crate::tracking::reporter::Collector;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct RecordingCollector {
        delivered: Arc<Mutex<Vec<TrackEvent>>>,
    }

    impl RecordingCollector {
        fn names(&self) -> Vec<String> {
            self.delivered
                .lock()
                .unwrap()
                .iter()
                .map(|e| e.event_name.clone())
                .collect()
        }
    }

    impl Collector for RecordingCollector {
        fn name(&self) -> &str {
            "recording"
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn deliver(&self, event: &TrackEvent) -> Result<(), TrackError> {
            self.delivered.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    /// Lead store whose behavior is scripted per test.
    #[derive(Clone, Default)]
    struct ScriptedStore {
        existing: Arc<Mutex<Vec<String>>>,
        fail_exists: Arc<Mutex<bool>>,
        fail_insert: Arc<Mutex<bool>>,
        inserted: Arc<Mutex<Vec<LeadRecord>>>,
    }

    impl LeadStore for ScriptedStore {
        fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
            if *self.fail_exists.lock().unwrap() {
                return Err(StoreError::Unavailable("scripted outage".into()));
            }
            Ok(self.existing.lock().unwrap().iter().any(|e| e == email))
        }

        fn insert(&self, record: &LeadRecord) -> Result<LeadRecord, StoreError> {
            if *self.fail_insert.lock().unwrap() {
                return Err(StoreError::Unavailable("scripted outage".into()));
            }
            self.inserted.lock().unwrap().push(record.clone());
            Ok(record.clone())
        }
    }

    struct Harness {
        engine: FunnelEngine,
        collector: RecordingCollector,
        store: ScriptedStore,
        _dir: TempDir,
    }

    /// Zero all delays so tests drive transitions synchronously.
    fn instant_flow() -> FlowConfig {
        FlowConfig {
            advance_delay_ms: 0,
            analysis_tick_ms: 0,
            analysis_exit_ms: 0,
            loading_ms: 0,
            ..FlowConfig::default()
        }
    }

    fn harness() -> Harness {
        harness_with_flow(instant_flow())
    }

    fn harness_with_flow(flow: FlowConfig) -> Harness {
        let dir = TempDir::new().unwrap();
        let collector = RecordingCollector::default();
        let store = ScriptedStore::default();
        let queue = PendingQueue::with_path(dir.path().join("q.json"));
        let reporter = EventReporter::with_queue(
            Box::new(collector.clone()),
            SessionTelemetry::init(),
            0,
            queue,
        );
        let engine = FunnelEngine::resume(
            FunnelState::default(),
            StepCatalog::default_funnel(),
            reporter,
            Box::new(store.clone()),
            flow,
            19.90,
        )
        .unwrap();
        Harness {
            engine,
            collector,
            store,
            _dir: dir,
        }
    }

    fn settle(engine: &mut FunnelEngine) {
        while engine.tick().is_some() {}
    }

    #[test]
    fn starts_at_first_step() {
        let h = harness();
        assert_eq!(h.engine.phase(), FunnelPhase::Asking { step_index: 0 });
        assert_eq!(h.engine.current_step().unwrap().id, "age");
    }

    #[test]
    fn start_is_idempotent_and_emits_quiz_start() {
        let mut h = harness();
        assert!(h.engine.start().is_some());
        assert!(h.engine.start().is_none());
        assert_eq!(h.collector.names(), ["quiz-start"]);
    }

    #[test]
    fn accepted_answer_scores_and_advances() {
        let mut h = harness();
        let answered = h.engine.record_answer("age", "45-54".into()).unwrap();
        assert_eq!(answered.points_awarded, 15);
        assert_eq!(answered.total_points, 15);
        assert_eq!(answered.badge.as_ref().unwrap().id, "profile-identified");
        assert_eq!(answered.progress_pct, 11);

        settle(&mut h.engine);
        assert_eq!(h.engine.phase(), FunnelPhase::Asking { step_index: 1 });
    }

    #[test]
    fn out_of_order_answer_is_a_no_op() {
        let mut h = harness();
        let err = h.engine.record_answer("investment", "yes".into());
        assert!(matches!(err, Err(AnswerError::UnexpectedStep { .. })));
        assert_eq!(h.engine.score().points(), 0);
        assert_eq!(h.engine.phase(), FunnelPhase::Asking { step_index: 0 });
        assert!(h.engine.take_events().is_empty());
        assert!(h.collector.names().is_empty());
    }

    #[test]
    fn double_submit_during_pacing_is_rejected() {
        let mut h = harness_with_flow(FlowConfig {
            advance_delay_ms: 60_000,
            ..instant_flow()
        });
        h.engine.record_answer("age", "45-54".into()).unwrap();
        let err = h.engine.record_answer("age", "35-44".into());
        assert!(matches!(err, Err(AnswerError::TransitionPending)));
        assert_eq!(h.engine.answers().text("age"), Some("45-54"));
    }

    #[test]
    fn invalid_choice_is_rejected() {
        let mut h = harness();
        let err = h.engine.record_answer("age", "18-25".into());
        assert!(matches!(err, Err(AnswerError::InvalidChoice { .. })));
        assert_eq!(h.engine.score().points(), 0);
    }

    #[test]
    fn slider_bounds_are_enforced() {
        let mut h = harness();
        h.engine.record_answer("age", "45-54".into()).unwrap();
        settle(&mut h.engine);

        let err = h.engine.record_answer("pain_level", AnswerValue::Scale(11));
        assert!(matches!(err, Err(AnswerError::SliderOutOfRange { .. })));
        h.engine
            .record_answer("pain_level", AnswerValue::Scale(10))
            .unwrap();
    }

    #[test]
    fn checkpoint_answer_triggers_analysis_detour() {
        let mut h = harness();
        for (id, v) in [
            ("age", AnswerValue::from("45-54")),
            ("pain_level", AnswerValue::Scale(8)),
            ("main_problem", "back".into()),
            ("duration", "chronic".into()),
        ] {
            h.engine.record_answer(id, v).unwrap();
            settle(&mut h.engine);
        }
        assert_eq!(h.engine.current_step().unwrap().id, "previous_treatment");

        h.engine.record_answer("previous_treatment", "none".into()).unwrap();
        // Pacing delay, then the detour.
        let ev = h.engine.tick().unwrap();
        assert!(matches!(ev, Event::AnalysisStarted { .. }));
        assert_eq!(h.engine.phase(), FunnelPhase::MidAnalysis { tick: 0 });

        settle(&mut h.engine);
        // Resumed at the configured index (email in the reference catalog).
        assert_eq!(h.engine.phase(), FunnelPhase::Asking { step_index: 5 });
        assert_eq!(h.engine.current_step().unwrap().id, "email");
    }

    #[test]
    fn analysis_ticks_the_configured_number_of_times() {
        let mut h = harness();
        for (id, v) in [
            ("age", AnswerValue::from("45-54")),
            ("pain_level", AnswerValue::Scale(5)),
            ("main_problem", "neck".into()),
            ("duration", "recent".into()),
            ("previous_treatment", "some".into()),
        ] {
            h.engine.record_answer(id, v).unwrap();
            settle(&mut h.engine);
        }
        // Entry shows tick 0; four advances walk through the remaining lines.
        let events = h.engine.take_events();
        let ticks = events
            .iter()
            .filter(|e| matches!(e, Event::AnalysisAdvanced { .. }))
            .count();
        assert_eq!(ticks, 4);
        assert_eq!(h.engine.phase(), FunnelPhase::Asking { step_index: 5 });
    }

    #[test]
    fn duplicate_email_keeps_phase_and_answer_unset() {
        let mut h = harness();
        h.store.existing.lock().unwrap().push("user@test.com".into());
        answer_up_to_email(&mut h);

        let err = h.engine.record_answer("email", "user@test.com".into());
        assert!(matches!(err, Err(AnswerError::DuplicateEmail)));
        assert_eq!(h.engine.phase(), FunnelPhase::Asking { step_index: 5 });
        assert!(h.engine.answers().text("email").is_none());
        assert!(h.store.inserted.lock().unwrap().is_empty());
    }

    #[test]
    fn store_outage_on_exists_is_inline_and_retriable() {
        let mut h = harness();
        answer_up_to_email(&mut h);
        *h.store.fail_exists.lock().unwrap() = true;

        let err = h.engine.record_answer("email", "user@test.com".into());
        assert!(matches!(err, Err(AnswerError::StoreUnavailable(_))));
        assert_eq!(h.engine.phase(), FunnelPhase::Asking { step_index: 5 });
        assert!(h.engine.answers().text("email").is_none());

        // The user may resubmit once the outage clears.
        *h.store.fail_exists.lock().unwrap() = false;
        h.engine.record_answer("email", "user@test.com".into()).unwrap();
        assert_eq!(h.engine.answers().text("email"), Some("user@test.com"));
    }

    #[test]
    fn insert_failure_blocks_advancement() {
        let mut h = harness();
        answer_up_to_email(&mut h);
        *h.store.fail_insert.lock().unwrap() = true;

        let err = h.engine.record_answer("email", "user@test.com".into());
        assert!(matches!(err, Err(AnswerError::StoreUnavailable(_))));
        assert!(h.engine.answers().text("email").is_none());
    }

    #[test]
    fn accepted_email_inserts_lead_with_partial_answers() {
        let mut h = harness();
        answer_up_to_email(&mut h);

        h.engine.record_answer("email", "user@test.com".into()).unwrap();
        let inserted = h.store.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].email, "user@test.com");
        assert_eq!(inserted[0].age.as_deref(), Some("45-54"));
        assert_eq!(inserted[0].lifestyle, None);
        // Score at capture includes the email step's own points.
        assert_eq!(inserted[0].user_score, 15 + 20 + 25 + 20 + 30 + 35);
    }

    #[test]
    fn email_capture_emits_distinct_event() {
        let mut h = harness();
        answer_up_to_email(&mut h);
        h.engine.record_answer("email", "user@test.com".into()).unwrap();
        assert!(h.collector.names().contains(&"email-captured".to_string()));
    }

    #[test]
    fn final_answer_leads_to_loading_then_results() {
        let mut h = harness();
        run_full_funnel(&mut h);
        assert_eq!(h.engine.phase(), FunnelPhase::Results);

        let names = h.collector.names();
        assert_eq!(names.last().map(String::as_str), Some("quiz-complete"));
    }

    #[test]
    fn full_run_scores_every_step_exactly_once() {
        let mut h = harness();
        run_full_funnel(&mut h);
        assert_eq!(h.engine.score().points(), 240);
        assert_eq!(h.engine.score().badges().len(), 9);
    }

    #[test]
    fn progress_is_monotonic_and_exact() {
        let mut h = harness();
        run_full_funnel(&mut h);

        let percents: Vec<u64> = h
            .collector
            .delivered
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event_name == "progress-update")
            .map(|e| e.param("value").and_then(|v| v.as_u64()).unwrap())
            .collect();
        assert_eq!(percents.len(), 9);
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*percents.last().unwrap(), 100);
        assert_eq!(percents[0], (100.0_f64 / 9.0).round() as u64);
    }

    #[test]
    fn force_complete_emits_completion_once() {
        let mut h = harness();
        assert!(h.engine.force_complete().is_some());
        assert!(h.engine.force_complete().is_none());
        assert_eq!(h.engine.phase(), FunnelPhase::Results);
        assert_eq!(
            h.collector
                .names()
                .iter()
                .filter(|n| n.as_str() == "quiz-complete")
                .count(),
            1
        );
    }

    #[test]
    fn answers_rejected_outside_asking_phase() {
        let mut h = harness();
        h.engine.force_complete();
        let err = h.engine.record_answer("age", "45-54".into());
        assert!(matches!(err, Err(AnswerError::NotAsking)));
    }

    #[test]
    fn state_roundtrips_through_serde() {
        let mut h = harness();
        h.engine.record_answer("age", "45-54".into()).unwrap();
        settle(&mut h.engine);

        let json = serde_json::to_string(h.engine.state()).unwrap();
        let restored: FunnelState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.phase(), FunnelPhase::Asking { step_index: 1 });
        assert_eq!(restored.answers().text("age"), Some("45-54"));
        assert_eq!(restored.score().points(), 15);
    }

    #[test]
    fn resume_index_out_of_bounds_is_rejected() {
        let dir = TempDir::new().unwrap();
        let queue = PendingQueue::with_path(dir.path().join("q.json"));
        let reporter = EventReporter::with_queue(
            Box::new(RecordingCollector::default()),
            SessionTelemetry::init(),
            0,
            queue,
        );
        let result = FunnelEngine::resume(
            FunnelState::default(),
            StepCatalog::default_funnel(),
            reporter,
            Box::<ScriptedStore>::default(),
            FlowConfig {
                resume_index: 99,
                ..FlowConfig::default()
            },
            19.90,
        );
        assert!(result.is_err());
    }

    fn answer_up_to_email(h: &mut Harness) {
        for (id, v) in [
            ("age", AnswerValue::from("45-54")),
            ("pain_level", AnswerValue::Scale(8)),
            ("main_problem", "back".into()),
            ("duration", "chronic".into()),
            ("previous_treatment", "none".into()),
        ] {
            h.engine.record_answer(id, v).unwrap();
            settle(&mut h.engine);
        }
        assert_eq!(h.engine.current_step().unwrap().id, "email");
    }

    fn run_full_funnel(h: &mut Harness) {
        h.engine.start();
        answer_up_to_email(h);
        for (id, v) in [
            ("email", AnswerValue::from("user@test.com")),
            ("lifestyle", "sedentary".into()),
            ("time_available", "15min".into()),
            ("investment", "yes".into()),
        ] {
            h.engine.record_answer(id, v).unwrap();
            settle(&mut h.engine);
        }
    }
}
