//! Shared plumbing for CLI commands: engine persistence in the kv store
//! and collaborator construction from configuration.

use chrono::Utc;

use alivio_core::error::StoreError;
use alivio_core::funnel::{FunnelEngine, FunnelState};
use alivio_core::leads::{HttpLeadStore, LeadRecord, LeadStore};
use alivio_core::storage::{Config, Database};
use alivio_core::telemetry::SessionTelemetry;
use alivio_core::tracking::{EventReporter, HttpCollector};
use alivio_core::StepCatalog;

pub const STATE_KEY: &str = "funnel_state";
pub const TELEMETRY_KEY: &str = "session_telemetry";
pub const OFFER_DEADLINE_KEY: &str = "offer_deadline_ms";

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Lead store backed by the local database. Used when no external lead
/// service is configured, so the funnel stays fully driveable offline.
/// Enforces email uniqueness at insert time like the real backend.
pub struct LocalLeadStore {
    db: Database,
}

impl LocalLeadStore {
    pub fn open() -> Result<Self, StoreError> {
        let db = Database::open().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { db })
    }

    fn key(email: &str) -> String {
        format!("lead:{email}")
    }
}

impl LeadStore for LocalLeadStore {
    fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        self.db
            .kv_get(&Self::key(email))
            .map(|v| v.is_some())
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn insert(&self, record: &LeadRecord) -> Result<LeadRecord, StoreError> {
        if self.exists_by_email(&record.email)? {
            return Err(StoreError::DuplicateEmail);
        }
        let mut stored = record.clone();
        stored.created_at = Some(Utc::now());
        let json = serde_json::to_string(&stored)
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        self.db
            .kv_set(&Self::key(&record.email), &json)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(stored)
    }
}

pub fn build_reporter(config: &Config, db: &Database) -> CliResult<EventReporter> {
    let collector = HttpCollector::new(config.tracking.collector_url.as_deref())?;
    let telemetry = match db.kv_get(TELEMETRY_KEY)? {
        Some(json) => serde_json::from_str(&json).unwrap_or_else(|_| SessionTelemetry::init()),
        None => SessionTelemetry::init(),
    };
    Ok(EventReporter::new(
        Box::new(collector),
        telemetry,
        config.tracking.retry_delay_ms,
    ))
}

pub fn build_lead_store(config: &Config) -> CliResult<Box<dyn LeadStore>> {
    if config.leads.base_url.is_empty() {
        Ok(Box::new(LocalLeadStore::open()?))
    } else {
        Ok(Box::new(HttpLeadStore::new(&config.leads)?))
    }
}

/// Rebuild the engine from the kv store (or start fresh) with collaborators
/// wired from configuration.
pub fn load_engine(config: &Config, db: &Database) -> CliResult<FunnelEngine> {
    let state: FunnelState = match db.kv_get(STATE_KEY)? {
        Some(json) => serde_json::from_str(&json)?,
        None => FunnelState::default(),
    };
    let reporter = build_reporter(config, db)?;
    let leads = build_lead_store(config)?;
    let engine = FunnelEngine::resume(
        state,
        StepCatalog::default_funnel(),
        reporter,
        leads,
        config.flow.clone(),
        config.offer.price,
    )?;
    Ok(engine)
}

/// Persist engine state and telemetry; unresolved analytics retries are
/// spilled to the durable queue on the way out.
pub fn save_engine(db: &Database, engine: FunnelEngine) -> CliResult<()> {
    let telemetry_json = serde_json::to_string(engine.telemetry())?;
    let state = engine.suspend();
    db.kv_set(STATE_KEY, &serde_json::to_string(&state)?)?;
    db.kv_set(TELEMETRY_KEY, &telemetry_json)?;
    Ok(())
}

/// Forget the current session entirely.
pub fn clear_session(db: &Database) -> CliResult<()> {
    db.kv_delete(STATE_KEY)?;
    db.kv_delete(TELEMETRY_KEY)?;
    db.kv_delete(OFFER_DEADLINE_KEY)?;
    Ok(())
}
