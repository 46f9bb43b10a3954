use clap::Subcommand;

use alivio_core::funnel::FunnelPhase;
use alivio_core::offer::{Offer, OfferCountdown};
use alivio_core::storage::{Config, Database};

use crate::common;

#[derive(Subcommand)]
pub enum OfferAction {
    /// Show the offer with its urgency countdown
    Show,
    /// Record purchase intent and print the checkout URL
    Intent {
        /// Also open the checkout URL in the browser
        #[arg(long)]
        open: bool,
    },
}

pub fn run(action: OfferAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;

    let engine = common::load_engine(&config, &db)?;
    if engine.phase() != FunnelPhase::Results {
        eprintln!("complete the assessment first (`alivio quiz status`)");
        std::process::exit(1);
    }
    drop(engine);

    let offer = Offer::from_config(&config.offer);
    let countdown = load_countdown(&config, &db)?;
    let mut reporter = common::build_reporter(&config, &db)?;

    match action {
        OfferAction::Show => {
            offer.view(&mut reporter);
            println!(
                "Your personalized plan: {} {:.2}",
                offer.currency(),
                offer.price()
            );
            if countdown.is_expired() {
                println!("the launch price has expired");
            } else {
                println!("offer expires in {}", countdown.format_remaining());
                if countdown.is_urgent() {
                    println!("(last minutes at this price)");
                }
            }
        }
        OfferAction::Intent { open } => {
            match offer.purchase_intent(&mut reporter) {
                Some(url) => {
                    println!("checkout: {url}");
                    if open {
                        offer.open_checkout()?;
                    }
                }
                None => println!("no checkout URL configured (offer.checkout_url)"),
            }
        }
    }

    reporter.flush_retries_to_queue();
    db.kv_set(
        common::TELEMETRY_KEY,
        &serde_json::to_string(reporter.telemetry())?,
    )?;
    Ok(())
}

fn load_countdown(
    config: &Config,
    db: &Database,
) -> Result<OfferCountdown, Box<dyn std::error::Error>> {
    if let Some(raw) = db.kv_get(common::OFFER_DEADLINE_KEY)? {
        if let Ok(deadline) = raw.parse::<u64>() {
            return Ok(OfferCountdown::resume(deadline, config.offer.countdown_secs));
        }
    }
    let countdown = OfferCountdown::new(config.offer.countdown_secs);
    db.kv_set(
        common::OFFER_DEADLINE_KEY,
        &countdown.deadline_epoch_ms().to_string(),
    )?;
    Ok(countdown)
}
