use alivio_core::funnel::FunnelPhase;
use alivio_core::results::{ResultsProfile, SocialProof};
use alivio_core::storage::{Config, Database};

use crate::common;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let engine = common::load_engine(&config, &db)?;

    if engine.phase() != FunnelPhase::Results {
        eprintln!("complete the assessment first (`alivio quiz status`)");
        std::process::exit(1);
    }

    let profile = ResultsProfile::derive(engine.answers(), engine.score().points());

    println!("{}", profile.archetype.title);
    println!("{}", profile.archetype.subtitle);
    println!("{}", profile.archetype.description);
    println!();
    for insight in &profile.insights {
        println!("- {}", insight.text);
    }
    if !profile.insights.is_empty() {
        println!();
    }
    println!(
        "estimated success probability: {}%",
        profile.success_probability
    );
    println!(
        "score: {} points, {} badge(s)",
        engine.score().points(),
        engine.score().badges().len()
    );
    for badge in engine.score().badges() {
        println!("  {}", badge.label);
    }
    println!();
    println!(
        "{} people are taking the assessment right now",
        SocialProof::new().current()
    );

    common::save_engine(&db, engine)?;
    Ok(())
}
