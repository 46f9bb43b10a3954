use clap::Subcommand;

use alivio_core::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Conversion summary over all completed sessions
    Summary,
    /// Most recent completed sessions
    Recent {
        /// How many sessions to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        StatsAction::Summary => {
            let stats = db.stats()?;
            println!("sessions completed: {}", stats.total_sessions);
            println!("  today:            {}", stats.today_sessions);
            println!("leads captured:     {}", stats.leads_captured);
            println!("average score:      {:.1}", stats.avg_points);
            println!("best score:         {}", stats.best_points);
        }
        StatsAction::Recent { limit } => {
            let sessions = db.recent_sessions(limit)?;
            if sessions.is_empty() {
                println!("no completed sessions yet");
                return Ok(());
            }
            for s in sessions {
                let lead = if s.email.is_empty() { "-" } else { s.email.as_str() };
                println!(
                    "{}  {:>4} pts  {} badge(s)  {}",
                    s.completed_at.format("%Y-%m-%d %H:%M"),
                    s.points,
                    s.badge_count,
                    lead
                );
            }
        }
    }
    Ok(())
}
