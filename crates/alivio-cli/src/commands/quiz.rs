use std::time::Duration;

use clap::Subcommand;

use alivio_core::funnel::{AnswerValue, FunnelEngine, FunnelPhase, StepKind};
use alivio_core::offer::OfferCountdown;
use alivio_core::storage::{Config, Database};
use alivio_core::Event;

use crate::common;

#[derive(Subcommand)]
pub enum QuizAction {
    /// Start a new assessment session
    Start,
    /// Answer the currently active step
    Answer {
        /// Step id (see `alivio catalog list`)
        step_id: String,
        /// Answer value (option value, 0-10 pain level, or email)
        value: String,
    },
    /// Print the current funnel state as JSON
    Status,
    /// Jump straight to the results
    Complete,
    /// Forget the current session
    Reset,
}

pub fn run(action: QuizAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;

    match action {
        QuizAction::Start => {
            let mut engine = common::load_engine(&config, &db)?;
            if engine.start().is_none() {
                println!("session already started");
            }
            print_current_step(&engine);
            common::save_engine(&db, engine)?;
        }
        QuizAction::Answer { step_id, value } => {
            let mut engine = common::load_engine(&config, &db)?;
            let _ = engine.start();

            let parsed = parse_value(&engine, &step_id, &value)?;
            match engine.record_answer(&step_id, parsed) {
                Ok(answered) => {
                    println!(
                        "+{} points ({} total, {}% complete)",
                        answered.points_awarded, answered.total_points, answered.progress_pct
                    );
                    if let Some(badge) = &answered.badge {
                        println!("unlocked: {}", badge.label);
                    }
                    drive_to_rest(&mut engine);
                    match engine.phase() {
                        FunnelPhase::Asking { .. } => print_current_step(&engine),
                        FunnelPhase::Results => finish_session(&config, &db, &engine)?,
                        _ => {}
                    }
                }
                Err(e) => {
                    // Inline feedback; the step stays active for another try.
                    println!("not accepted: {e}");
                }
            }
            common::save_engine(&db, engine)?;
        }
        QuizAction::Status => {
            let mut engine = common::load_engine(&config, &db)?;
            let _ = engine.tick();
            let snapshot = engine.snapshot();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            if engine.phase() != FunnelPhase::Results {
                print_current_step(&engine);
            }
            common::save_engine(&db, engine)?;
        }
        QuizAction::Complete => {
            let mut engine = common::load_engine(&config, &db)?;
            let _ = engine.start();
            if let Some(Event::Completed { points, .. }) = engine.force_complete() {
                println!("assessment completed with {points} points");
                finish_session(&config, &db, &engine)?;
            } else {
                println!("already completed");
            }
            common::save_engine(&db, engine)?;
        }
        QuizAction::Reset => {
            common::clear_session(&db)?;
            println!("session reset");
        }
    }
    Ok(())
}

/// Interpret the raw CLI value for the targeted step.
fn parse_value(
    engine: &FunnelEngine,
    step_id: &str,
    value: &str,
) -> Result<AnswerValue, Box<dyn std::error::Error>> {
    match engine.catalog().step_by_id(step_id).map(|s| s.kind) {
        Some(StepKind::Slider) => {
            let level: u8 = value
                .parse()
                .map_err(|_| format!("'{value}' is not a pain level (expected 0-10)"))?;
            Ok(AnswerValue::Scale(level))
        }
        // Unknown ids fall through as text; the engine rejects them with
        // its own message.
        _ => Ok(AnswerValue::Text(value.to_string())),
    }
}

/// Walk the wall-clock transitions (pacing, analysis, loading) to their
/// resting phase, narrating along the way.
fn drive_to_rest(engine: &mut FunnelEngine) {
    while !engine.is_settled() {
        std::thread::sleep(Duration::from_millis(50));
        if let Some(event) = engine.tick() {
            print_event(&event);
        }
    }
}

fn print_event(event: &Event) {
    match event {
        Event::AnalysisStarted { .. } => println!("analyzing your answers..."),
        Event::AnalysisAdvanced { tick, total_ticks, .. } => {
            println!("  analysis step {}/{}", tick + 1, total_ticks)
        }
        Event::LoadingStarted { .. } => println!("preparing your personalized plan..."),
        Event::Completed { points, .. } => println!("assessment complete! {points} points"),
        Event::StepEntered { .. }
        | Event::SessionStarted { .. }
        | Event::AnswerRecorded { .. }
        | Event::CelebrationRequested { .. }
        | Event::StateSnapshot { .. } => {}
    }
}

fn print_current_step(engine: &FunnelEngine) {
    let Some(step) = engine.current_step() else {
        return;
    };
    println!();
    println!("{}", step.prompt);
    println!("{}", step.subtitle);
    match step.kind {
        StepKind::Choice => {
            for option in &step.options {
                println!("  {:<12} {} {}", option.value, option.icon, option.label);
            }
        }
        StepKind::Slider => println!("  answer with a number from 0 to 10"),
        StepKind::Email => println!("  answer with your email address"),
    }
    println!("(alivio quiz answer {} <value>)", step.id);
}

/// Completion bookkeeping: log the session and arm the offer countdown.
fn finish_session(
    config: &Config,
    db: &Database,
    engine: &FunnelEngine,
) -> Result<(), Box<dyn std::error::Error>> {
    let email = engine.answers().text("email").unwrap_or("");
    db.record_completed(
        engine.telemetry().session_id(),
        email,
        engine.score().points(),
        engine.score().badges().len() as u32,
        chrono::Utc::now(),
    )?;

    if db.kv_get(common::OFFER_DEADLINE_KEY)?.is_none() {
        let countdown = OfferCountdown::new(config.offer.countdown_secs);
        db.kv_set(
            common::OFFER_DEADLINE_KEY,
            &countdown.deadline_epoch_ms().to_string(),
        )?;
    }

    println!("see your plan with `alivio results` and `alivio offer show`");
    Ok(())
}
