//! PostgREST-style lead store client.

use reqwest::Client;
use url::Url;

use crate::error::{ConfigError, StoreError};
use crate::leads::record::LeadRecord;
use crate::leads::LeadStore;
use crate::storage::config::LeadsConfig;

/// Lead persistence client over a PostgREST-style REST endpoint.
pub struct HttpLeadStore {
    base_url: Url,
    api_key: String,
    table: String,
    client: Client,
    rt: tokio::runtime::Runtime,
}

impl HttpLeadStore {
    pub fn new(cfg: &LeadsConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&cfg.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "leads.base_url".into(),
            message: e.to_string(),
        })?;
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "leads.base_url".into(),
                message: format!("http runtime: {e}"),
            })?;
        Ok(Self {
            base_url,
            api_key: cfg.api_key.clone(),
            table: cfg.table.clone(),
            client: Client::new(),
            rt,
        })
    }

    fn table_url(&self) -> String {
        format!(
            "{}rest/v1/{}",
            self.base_url,
            urlencoding::encode(&self.table)
        )
    }

    fn map_status(status: reqwest::StatusCode, body: &str) -> StoreError {
        if status.as_u16() == 409 || body.contains("duplicate key") {
            StoreError::DuplicateEmail
        } else if status.is_server_error() {
            StoreError::Unavailable(format!("HTTP {status}"))
        } else {
            StoreError::Rejected {
                status: status.as_u16(),
                message: body.to_string(),
            }
        }
    }
}

impl LeadStore for HttpLeadStore {
    fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let url = format!(
            "{}?select=email&email=eq.{}&limit=1",
            self.table_url(),
            urlencoding::encode(email)
        );

        let resp = self.rt.block_on(
            self.client
                .get(&url)
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key)
                .send(),
        )?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = self.rt.block_on(resp.text()).unwrap_or_default();
            return Err(Self::map_status(status, &body));
        }

        let rows: Vec<serde_json::Value> = self
            .rt
            .block_on(resp.json())
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        Ok(!rows.is_empty())
    }

    fn insert(&self, record: &LeadRecord) -> Result<LeadRecord, StoreError> {
        let resp = self.rt.block_on(
            self.client
                .post(self.table_url())
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key)
                .header("Prefer", "return=representation")
                .json(record)
                .send(),
        )?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = self.rt.block_on(resp.text()).unwrap_or_default();
            return Err(Self::map_status(status, &body));
        }

        // PostgREST returns the inserted rows as an array.
        let mut rows: Vec<LeadRecord> = self
            .rt
            .block_on(resp.json())
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;
        rows.pop()
            .ok_or_else(|| StoreError::InvalidResponse("empty insert response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funnel::answers::AnswerSet;

    fn store_for(server: &mockito::ServerGuard) -> HttpLeadStore {
        HttpLeadStore::new(&LeadsConfig {
            base_url: format!("{}/", server.url()),
            api_key: "test-key".into(),
            table: "quiz_responses".into(),
        })
        .unwrap()
    }

    fn sample_record() -> LeadRecord {
        let mut answers = AnswerSet::new();
        answers.record("age", "45-54".into());
        LeadRecord::from_answers("user@test.com", &answers, 145)
    }

    #[test]
    fn exists_true_when_rows_returned() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/rest/v1/quiz_responses")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("select".into(), "email".into()),
                mockito::Matcher::UrlEncoded("email".into(), "eq.user@test.com".into()),
            ]))
            .match_header("apikey", "test-key")
            .with_status(200)
            .with_body(r#"[{"email":"user@test.com"}]"#)
            .create();

        let store = store_for(&server);
        assert!(store.exists_by_email("user@test.com").unwrap());
        mock.assert();
    }

    #[test]
    fn exists_false_on_empty_result() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/v1/quiz_responses")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create();

        let store = store_for(&server);
        assert!(!store.exists_by_email("fresh@test.com").unwrap());
    }

    #[test]
    fn exists_maps_server_errors_to_unavailable() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/rest/v1/quiz_responses")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create();

        let store = store_for(&server);
        assert!(matches!(
            store.exists_by_email("user@test.com"),
            Err(StoreError::Unavailable(_))
        ));
    }

    #[test]
    fn insert_returns_stored_record() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/rest/v1/quiz_responses")
            .match_header("prefer", "return=representation")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"email": "user@test.com", "user_score": 145}"#.to_string(),
            ))
            .with_status(201)
            .with_body(
                r#"[{"email":"user@test.com","age":"45-54","user_score":145,
                     "created_at":"2026-08-05T12:00:00Z"}]"#,
            )
            .create();

        let store = store_for(&server);
        let stored = store.insert(&sample_record()).unwrap();
        assert_eq!(stored.email, "user@test.com");
        assert!(stored.created_at.is_some());
        mock.assert();
    }

    #[test]
    fn insert_conflict_maps_to_duplicate_email() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/rest/v1/quiz_responses")
            .with_status(409)
            .with_body(r#"{"message":"duplicate key value violates unique constraint"}"#)
            .create();

        let store = store_for(&server);
        assert!(matches!(
            store.insert(&sample_record()),
            Err(StoreError::DuplicateEmail)
        ));
    }

    #[test]
    fn network_failure_maps_to_unavailable() {
        // Nothing listens on this port.
        let store = HttpLeadStore::new(&LeadsConfig {
            base_url: "http://127.0.0.1:9/".into(),
            api_key: "k".into(),
            table: "quiz_responses".into(),
        })
        .unwrap();
        assert!(matches!(
            store.exists_by_email("user@test.com"),
            Err(StoreError::Unavailable(_))
        ));
    }
}
