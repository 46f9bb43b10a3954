//! Behavioral analytics events and their builders.
//!
//! Event names are owned by this core; the wire shape is owned by the
//! collector. Builders attach the content metadata the collector expects
//! (content name/category, monetary value, currency).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const CURRENCY: &str = "BRL";

/// One analytics event. Also the persisted shape of the pending queue
/// (a JSON array of `{eventName, parameters, timestamp}` entries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEvent {
    pub event_name: String,
    pub parameters: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl TrackEvent {
    pub fn new(name: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            event_name: name.into(),
            parameters,
            timestamp: Utc::now(),
        }
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    pub fn set_param(&mut self, key: &str, value: Value) {
        self.parameters.insert(key.to_string(), value);
    }
}

fn params(entries: Vec<(&str, Value)>) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// First screen of the session was reached.
pub fn quiz_start() -> TrackEvent {
    TrackEvent::new(
        "quiz-start",
        params(vec![
            ("content_name", json!("Health assessment started")),
            ("content_category", json!("Quiz")),
            ("value", json!(0)),
            ("currency", json!(CURRENCY)),
        ]),
    )
}

/// A step was answered; `percent` is `100 * answered / total`.
pub fn progress_update(percent: u32) -> TrackEvent {
    TrackEvent::new(
        "progress-update",
        params(vec![
            ("content_name", json!(format!("Assessment progress {percent}%"))),
            ("content_category", json!("Quiz Progress")),
            ("value", json!(percent)),
            ("currency", json!(CURRENCY)),
        ]),
    )
}

/// The lead record was persisted; `value` is the offer price.
pub fn email_captured(value: f64) -> TrackEvent {
    TrackEvent::new(
        "email-captured",
        params(vec![
            ("content_name", json!("Email captured")),
            ("content_category", json!("Lead Generation")),
            ("value", json!(value)),
            ("currency", json!(CURRENCY)),
        ]),
    )
}

/// The funnel reached its terminal phase with the final score.
pub fn quiz_complete(score: u32) -> TrackEvent {
    TrackEvent::new(
        "quiz-complete",
        params(vec![
            ("content_name", json!("Assessment complete")),
            ("content_category", json!("Quiz Completion")),
            ("value", json!(score)),
            ("currency", json!(CURRENCY)),
        ]),
    )
}

/// The offer stage was shown.
pub fn offer_viewed(price: f64) -> TrackEvent {
    TrackEvent::new(
        "offer-viewed",
        params(vec![
            ("content_name", json!("Offer viewed")),
            ("content_category", json!("Offer")),
            ("value", json!(price)),
            ("currency", json!(CURRENCY)),
        ]),
    )
}

/// The user asked for the checkout redirect.
pub fn purchase_intent(price: f64) -> TrackEvent {
    TrackEvent::new(
        "purchase-intent",
        params(vec![
            ("content_name", json!("Purchase intent")),
            ("content_category", json!("Purchase Intent")),
            ("value", json!(price)),
            ("currency", json!(CURRENCY)),
        ]),
    )
}
