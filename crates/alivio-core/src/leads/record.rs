use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::funnel::answers::AnswerSet;

/// The persisted record of one user's full answer set plus derived score,
/// keyed by email. Written once; there is no update or delete path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pain_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_problem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifestyle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_available: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investment: Option<String>,
    pub user_score: u32,
    /// Assigned by the backend on insert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl LeadRecord {
    /// Snapshot the answers gathered so far. Steps answered after the email
    /// gate are simply absent from the record.
    pub fn from_answers(email: &str, answers: &AnswerSet, user_score: u32) -> Self {
        let text = |id: &str| answers.text(id).map(str::to_string);
        Self {
            email: email.to_string(),
            age: text("age"),
            pain_level: answers.scale("pain_level"),
            main_problem: text("main_problem"),
            duration: text("duration"),
            previous_treatment: text("previous_treatment"),
            lifestyle: text("lifestyle"),
            time_available: text("time_available"),
            investment: text("investment"),
            user_score,
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funnel::answers::AnswerValue;

    #[test]
    fn from_answers_maps_known_fields() {
        let mut answers = AnswerSet::new();
        answers.record("age", "45-54".into());
        answers.record("pain_level", AnswerValue::Scale(8));
        answers.record("main_problem", "back".into());

        let record = LeadRecord::from_answers("user@test.com", &answers, 90);
        assert_eq!(record.email, "user@test.com");
        assert_eq!(record.age.as_deref(), Some("45-54"));
        assert_eq!(record.pain_level, Some(8));
        assert_eq!(record.main_problem.as_deref(), Some("back"));
        assert_eq!(record.lifestyle, None);
        assert_eq!(record.user_score, 90);
    }

    #[test]
    fn unanswered_fields_are_omitted_from_wire_payload() {
        let answers = AnswerSet::new();
        let record = LeadRecord::from_answers("a@b.com", &answers, 0);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("lifestyle").is_none());
        assert!(json.get("created_at").is_none());
        assert_eq!(json["email"], "a@b.com");
        assert_eq!(json["user_score"], 0);
    }
}
