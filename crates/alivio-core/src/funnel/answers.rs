use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single answer value. The variant must match the step's input kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Pain scale, 0-10.
    Scale(u8),
    /// Choice value or email text.
    Text(String),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            AnswerValue::Scale(_) => None,
        }
    }

    pub fn as_scale(&self) -> Option<u8> {
        match self {
            AnswerValue::Scale(v) => Some(*v),
            AnswerValue::Text(_) => None,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::Text(s.to_string())
    }
}

impl From<u8> for AnswerValue {
    fn from(v: u8) -> Self {
        AnswerValue::Scale(v)
    }
}

/// Answers accumulated over one session, keyed by step id.
///
/// Entries are only added or overwritten, never removed; the set lives for
/// the duration of the session and is not persisted on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerSet {
    answers: BTreeMap<String, AnswerValue>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step_id: &str, value: AnswerValue) {
        self.answers.insert(step_id.to_string(), value);
    }

    pub fn get(&self, step_id: &str) -> Option<&AnswerValue> {
        self.answers.get(step_id)
    }

    pub fn text(&self, step_id: &str) -> Option<&str> {
        self.get(step_id).and_then(AnswerValue::as_text)
    }

    pub fn scale(&self, step_id: &str) -> Option<u8> {
        self.get(step_id).and_then(AnswerValue::as_scale)
    }

    pub fn contains(&self, step_id: &str) -> bool {
        self.answers.contains_key(step_id)
    }

    /// Number of distinct steps answered so far.
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.answers.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_overwrites_without_growing() {
        let mut set = AnswerSet::new();
        set.record("age", "35-44".into());
        set.record("age", "45-54".into());
        assert_eq!(set.answered_count(), 1);
        assert_eq!(set.text("age"), Some("45-54"));
    }

    #[test]
    fn scale_and_text_accessors() {
        let mut set = AnswerSet::new();
        set.record("pain_level", AnswerValue::Scale(8));
        set.record("email", "user@test.com".into());
        assert_eq!(set.scale("pain_level"), Some(8));
        assert_eq!(set.text("pain_level"), None);
        assert_eq!(set.text("email"), Some("user@test.com"));
    }

    #[test]
    fn missing_entries_are_absent_not_defaulted() {
        let set = AnswerSet::new();
        assert!(!set.contains("age"));
        assert!(set.get("age").is_none());
    }
}
