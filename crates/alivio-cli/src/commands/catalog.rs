use clap::Subcommand;

use alivio_core::StepCatalog;

#[derive(Subcommand)]
pub enum CatalogAction {
    /// List every step in presentation order
    List,
    /// Print one step definition as JSON
    Show {
        /// Step id
        id: String,
    },
}

pub fn run(action: CatalogAction) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = StepCatalog::default_funnel();
    match action {
        CatalogAction::List => {
            for (index, step) in catalog.steps().iter().enumerate() {
                let marker = if step.id == catalog.checkpoint_id() {
                    " (checkpoint)"
                } else {
                    ""
                };
                println!("{index}  {:<20} {:?}{marker}", step.id, step.kind);
            }
        }
        CatalogAction::Show { id } => match catalog.step_by_id(&id) {
            Some(step) => println!("{}", serde_json::to_string_pretty(step)?),
            None => {
                eprintln!("unknown step: {id}");
                std::process::exit(1);
            }
        },
    }
    Ok(())
}
