//! The offer stage: urgency countdown, offer-view and purchase-intent
//! tracking, and the external checkout redirect.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;
use crate::storage::config::OfferConfig;
use crate::tracking::events as track;
use crate::tracking::reporter::EventReporter;

/// Remaining time below which the offer is presented as urgent.
pub const URGENCY_THRESHOLD_SECS: u64 = 300;

/// Wall-clock urgency countdown. Like the funnel engine it holds no timer
/// of its own; callers read the remaining time whenever they render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferCountdown {
    deadline_epoch_ms: u64,
    total_secs: u64,
}

impl OfferCountdown {
    /// Start a countdown of `total_secs` from now.
    pub fn new(total_secs: u64) -> Self {
        Self {
            deadline_epoch_ms: now_ms() + total_secs * 1000,
            total_secs,
        }
    }

    /// Rebuild a countdown persisted by the host.
    pub fn resume(deadline_epoch_ms: u64, total_secs: u64) -> Self {
        Self {
            deadline_epoch_ms,
            total_secs,
        }
    }

    pub fn deadline_epoch_ms(&self) -> u64 {
        self.deadline_epoch_ms
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.deadline_epoch_ms.saturating_sub(now_ms()) / 1000
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs() == 0
    }

    pub fn is_urgent(&self) -> bool {
        self.remaining_secs() < URGENCY_THRESHOLD_SECS
    }

    /// `m:ss` rendering of the remaining time.
    pub fn format_remaining(&self) -> String {
        let secs = self.remaining_secs();
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}

/// The purchase offer shown on the results stage.
#[derive(Debug, Clone)]
pub struct Offer {
    price: f64,
    currency: String,
    checkout_url: Option<Url>,
}

impl Offer {
    pub fn from_config(cfg: &OfferConfig) -> Self {
        let checkout_url = if cfg.checkout_url.is_empty() {
            None
        } else {
            Url::parse(&cfg.checkout_url).ok()
        };
        Self {
            price: cfg.price,
            currency: cfg.currency.clone(),
            checkout_url,
        }
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn checkout_url(&self) -> Option<&Url> {
        self.checkout_url.as_ref()
    }

    /// The offer became visible.
    pub fn view(&self, reporter: &mut EventReporter) {
        reporter.emit(track::offer_viewed(self.price));
    }

    /// The user asked for the checkout. Returns the redirect target; no
    /// data beyond navigation is exchanged with it.
    pub fn purchase_intent(&self, reporter: &mut EventReporter) -> Option<&Url> {
        reporter.emit(track::purchase_intent(self.price));
        self.checkout_url.as_ref()
    }

    /// Launch the checkout URL in the system browser.
    pub fn open_checkout(&self) -> Result<(), CoreError> {
        let url = self
            .checkout_url
            .as_ref()
            .ok_or_else(|| CoreError::Custom("no checkout URL configured".into()))?;
        open::that(url.as_str())?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrackError;
    use crate::telemetry::SessionTelemetry;
    use crate::tracking::events::TrackEvent;
    use crate::tracking::pending::PendingQueue;
    use crate::tracking::reporter::Collector;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct SinkCollector {
        delivered: Arc<Mutex<Vec<TrackEvent>>>,
    }

    impl Collector for SinkCollector {
        fn name(&self) -> &str {
            "sink"
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn deliver(&self, event: &TrackEvent) -> Result<(), TrackError> {
            self.delivered.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn reporter(dir: &TempDir, collector: SinkCollector) -> EventReporter {
        EventReporter::with_queue(
            Box::new(collector),
            SessionTelemetry::init(),
            0,
            PendingQueue::with_path(dir.path().join("q.json")),
        )
    }

    fn offer(checkout: &str) -> Offer {
        Offer::from_config(&OfferConfig {
            checkout_url: checkout.into(),
            ..OfferConfig::default()
        })
    }

    #[test]
    fn fresh_countdown_is_not_urgent() {
        let countdown = OfferCountdown::new(600);
        assert!(!countdown.is_urgent());
        assert!(!countdown.is_expired());
        assert!(countdown.remaining_secs() <= 600);
        assert!(countdown.remaining_secs() >= 598);
    }

    #[test]
    fn expired_countdown_reads_zero() {
        let countdown = OfferCountdown::resume(0, 600);
        assert!(countdown.is_expired());
        assert!(countdown.is_urgent());
        assert_eq!(countdown.remaining_secs(), 0);
        assert_eq!(countdown.format_remaining(), "0:00");
    }

    #[test]
    fn format_pads_seconds() {
        let countdown = OfferCountdown::new(65);
        let formatted = countdown.format_remaining();
        assert!(formatted == "1:05" || formatted == "1:04", "{formatted}");
    }

    #[test]
    fn view_emits_offer_viewed_with_price() {
        let dir = TempDir::new().unwrap();
        let collector = SinkCollector::default();
        let mut reporter = reporter(&dir, collector.clone());

        offer("https://pay.example/checkout").view(&mut reporter);

        let events = collector.delivered.lock().unwrap();
        assert_eq!(events[0].event_name, "offer-viewed");
        assert_eq!(events[0].param("value"), Some(&serde_json::json!(19.9)));
    }

    #[test]
    fn purchase_intent_returns_redirect_target() {
        let dir = TempDir::new().unwrap();
        let collector = SinkCollector::default();
        let mut reporter = reporter(&dir, collector.clone());

        let offer = offer("https://pay.example/checkout");
        let url = offer.purchase_intent(&mut reporter).unwrap();
        assert_eq!(url.as_str(), "https://pay.example/checkout");
        assert_eq!(
            collector.delivered.lock().unwrap()[0].event_name,
            "purchase-intent"
        );
    }

    #[test]
    fn missing_checkout_url_yields_none() {
        let dir = TempDir::new().unwrap();
        let mut reporter = reporter(&dir, SinkCollector::default());
        assert!(offer("").purchase_intent(&mut reporter).is_none());
        assert!(offer("").open_checkout().is_err());
    }
}
