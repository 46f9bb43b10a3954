//! Session-scoped telemetry with an explicit lifecycle.
//!
//! One `SessionTelemetry` is constructed by the host and handed to the
//! event reporter. It stamps every outgoing event with the session id and
//! counts what was delivered versus queued. After `dispose()` further
//! emission is a logged no-op; nothing here has module-scope lifetime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tracking::events::TrackEvent;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTelemetry {
    session_id: String,
    started_at: DateTime<Utc>,
    emitted: u32,
    queued: u32,
    disposed: bool,
}

impl SessionTelemetry {
    /// Start tracking a fresh session.
    pub fn init() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            emitted: 0,
            queued: 0,
            disposed: false,
        }
    }

    /// Rehydrate telemetry for a session id persisted by the host.
    pub fn resume(session_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            started_at,
            emitted: 0,
            queued: 0,
            disposed: false,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn duration_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// Attach the session id to an outgoing event.
    pub fn stamp(&self, event: &mut TrackEvent) {
        event.set_param("session_id", self.session_id.clone().into());
    }

    pub fn note_emitted(&mut self) {
        self.emitted += 1;
    }

    pub fn note_queued(&mut self) {
        self.queued += 1;
    }

    pub fn emitted(&self) -> u32 {
        self.emitted
    }

    pub fn queued(&self) -> u32 {
        self.queued
    }

    /// End the session. Emission after this point is refused by the reporter.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
