//! TOML-based application configuration.
//!
//! Stores the tunable surface of the funnel:
//! - Flow pacing (answer delay, analysis ticking, loading duration)
//! - The analysis resume index
//! - Tracking collector endpoint and retry delay
//! - Lead store endpoint, key and table
//! - Offer price, checkout URL and countdown
//!
//! Configuration is stored at `~/.config/alivio/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;

/// Funnel pacing and branching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Pause between an accepted answer and the step transition.
    #[serde(default = "default_advance_delay_ms")]
    pub advance_delay_ms: u64,
    /// Number of analysis lines shown during the mid-quiz detour.
    #[serde(default = "default_analysis_ticks")]
    pub analysis_ticks: usize,
    /// Interval between analysis lines.
    #[serde(default = "default_analysis_tick_ms")]
    pub analysis_tick_ms: u64,
    /// Hold on the finished analysis before resuming questions.
    #[serde(default = "default_analysis_exit_ms")]
    pub analysis_exit_ms: u64,
    /// Step index the funnel resumes at after the analysis detour.
    /// Deliberately configuration, not derived from the checkpoint.
    #[serde(default = "default_resume_index")]
    pub resume_index: usize,
    /// Duration of the final loading phase.
    #[serde(default = "default_loading_ms")]
    pub loading_ms: u64,
}

/// Analytics tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Collector endpoint; events queue locally while unset.
    #[serde(default)]
    pub collector_url: Option<String>,
    /// Delay before the single in-session delivery retry.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

/// Lead persistence service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadsConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_leads_table")]
    pub table: String,
}

/// Offer and checkout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferConfig {
    #[serde(default = "default_price")]
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Opaque external checkout URL opened on purchase intent.
    #[serde(default)]
    pub checkout_url: String,
    /// Urgency countdown shown on the offer, in seconds.
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/alivio/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub leads: LeadsConfig,
    #[serde(default)]
    pub offer: OfferConfig,
}

// Default functions
fn default_advance_delay_ms() -> u64 {
    300
}
fn default_analysis_ticks() -> usize {
    5
}
fn default_analysis_tick_ms() -> u64 {
    1200
}
fn default_analysis_exit_ms() -> u64 {
    1000
}
fn default_resume_index() -> usize {
    5
}
fn default_loading_ms() -> u64 {
    5000
}
fn default_retry_delay_ms() -> u64 {
    2000
}
fn default_leads_table() -> String {
    "quiz_responses".into()
}
fn default_price() -> f64 {
    19.90
}
fn default_currency() -> String {
    "BRL".into()
}
fn default_countdown_secs() -> u64 {
    600
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            advance_delay_ms: default_advance_delay_ms(),
            analysis_ticks: default_analysis_ticks(),
            analysis_tick_ms: default_analysis_tick_ms(),
            analysis_exit_ms: default_analysis_exit_ms(),
            resume_index: default_resume_index(),
            loading_ms: default_loading_ms(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            collector_url: None,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl Default for LeadsConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            table: default_leads_table(),
        }
    }
}

impl Default for OfferConfig {
    fn default() -> Self {
        Self {
            price: default_price(),
            currency: default_currency(),
            checkout_url: String::new(),
            countdown_secs: default_countdown_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            flow: FlowConfig::default(),
            tracking: TrackingConfig::default(),
            leads: LeadsConfig::default(),
            offer: OfferConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err("config key is empty".into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| format!("unknown config key: {key}"))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| format!("unknown config key: {key}"))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>()?),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| format!("cannot parse '{value}' as number"))?
                        } else {
                            return Err(format!("cannot parse '{value}' as number").into());
                        }
                    }
                    serde_json::Value::Null => serde_json::Value::String(value.into()),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value)?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| format!("unknown config key: {key}"))?;
        }

        Err(format!("unknown config key: {key}").into())
    }

    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
