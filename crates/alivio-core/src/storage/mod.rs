pub mod config;
pub mod database;

pub use config::Config;
pub use database::{CompletedSession, Database, FunnelStats};

use std::path::PathBuf;

/// Returns `~/.config/alivio[-dev]/` based on ALIVIO_ENV.
///
/// Set ALIVIO_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("ALIVIO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("alivio-dev")
    } else {
        base_dir.join("alivio")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
