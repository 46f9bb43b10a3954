use clap::{Parser, Subcommand};

mod commands;
mod common;

#[derive(Parser)]
#[command(name = "alivio", version, about = "Alivio lead funnel CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the assessment funnel
    Quiz {
        #[command(subcommand)]
        action: commands::quiz::QuizAction,
    },
    /// Inspect the step catalog
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Pending analytics events
    Events {
        #[command(subcommand)]
        action: commands::events::EventsAction,
    },
    /// The offer stage
    Offer {
        #[command(subcommand)]
        action: commands::offer::OfferAction,
    },
    /// Personalized results for a completed session
    Results,
    /// Conversion statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Quiz { action } => commands::quiz::run(action),
        Commands::Catalog { action } => commands::catalog::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Events { action } => commands::events::run(action),
        Commands::Offer { action } => commands::offer::run(action),
        Commands::Results => commands::results::run(),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
