//! HTTP collector -- posts analytics events to the configured endpoint.

use reqwest::Client;
use url::Url;

use crate::error::TrackError;
use crate::tracking::events::TrackEvent;
use crate::tracking::reporter::Collector;

/// Collector speaking plain JSON POSTs to a pixel/analytics endpoint.
///
/// Without a configured endpoint the collector reports not-ready and the
/// reporter falls back to the pending queue, which is the normal state for
/// a fresh install.
pub struct HttpCollector {
    endpoint: Option<Url>,
    client: Client,
    rt: tokio::runtime::Runtime,
}

impl HttpCollector {
    /// Build a collector; `endpoint` may be absent or empty.
    pub fn new(endpoint: Option<&str>) -> Result<Self, TrackError> {
        let endpoint = match endpoint {
            Some(raw) if !raw.is_empty() => Some(
                Url::parse(raw)
                    .map_err(|e| TrackError::DeliveryFailed(format!("invalid collector url: {e}")))?,
            ),
            _ => None,
        };
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TrackError::DeliveryFailed(format!("http runtime: {e}")))?;
        Ok(Self {
            endpoint,
            client: Client::new(),
            rt,
        })
    }
}

impl Collector for HttpCollector {
    fn name(&self) -> &str {
        "pixel"
    }

    fn is_ready(&self) -> bool {
        self.endpoint.is_some()
    }

    fn deliver(&self, event: &TrackEvent) -> Result<(), TrackError> {
        let endpoint = self.endpoint.as_ref().ok_or(TrackError::NotReady)?;

        let resp = self
            .rt
            .block_on(self.client.post(endpoint.clone()).json(event).send())?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = self.rt.block_on(resp.text()).unwrap_or_default();
            Err(TrackError::DeliveryFailed(format!("HTTP {status}: {text}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::events;

    #[test]
    fn missing_endpoint_is_not_ready() {
        let collector = HttpCollector::new(None).unwrap();
        assert!(!collector.is_ready());
        assert!(matches!(
            collector.deliver(&events::quiz_start()),
            Err(TrackError::NotReady)
        ));
    }

    #[test]
    fn empty_endpoint_is_not_ready() {
        let collector = HttpCollector::new(Some("")).unwrap();
        assert!(!collector.is_ready());
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(HttpCollector::new(Some("not a url")).is_err());
    }

    #[test]
    fn deliver_posts_event_json() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/collect")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"eventName": "quiz-start"}"#.to_string(),
            ))
            .with_status(204)
            .create();

        let collector = HttpCollector::new(Some(&format!("{}/collect", server.url()))).unwrap();
        assert!(collector.is_ready());
        collector.deliver(&events::quiz_start()).unwrap();
        mock.assert();
    }

    #[test]
    fn deliver_maps_http_errors() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/collect")
            .with_status(500)
            .with_body("boom")
            .create();

        let collector = HttpCollector::new(Some(&format!("{}/collect", server.url()))).unwrap();
        let err = collector.deliver(&events::quiz_start()).unwrap_err();
        assert!(matches!(err, TrackError::DeliveryFailed(_)));
    }
}
