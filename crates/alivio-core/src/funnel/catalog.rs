use serde::{Deserialize, Serialize};

/// Input kind of a funnel step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    /// Pick one of the step's options.
    Choice,
    /// Integer pain scale, 0-10.
    Slider,
    /// Free-text email, gated by the lead store.
    Email,
}

/// One selectable option of a `Choice` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
    /// Icon reference for the presentation layer (emoji in the reference UI).
    pub icon: String,
    #[serde(default)]
    pub description: String,
}

/// One question/screen unit of the funnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub id: String,
    pub prompt: String,
    pub subtitle: String,
    pub kind: StepKind,
    /// Present only when `kind` is `Choice`.
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
}

impl StepDefinition {
    /// Whether `value` is one of this step's option values.
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

/// The ordered sequence of steps presented in a session.
///
/// The catalog is static and linear; the mid-quiz analysis detour is an
/// engine-level interrupt and never reorders or mutates the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepCatalog {
    steps: Vec<StepDefinition>,
    /// Step id after which the analysis detour triggers.
    checkpoint_id: String,
}

impl StepCatalog {
    pub fn new(steps: Vec<StepDefinition>, checkpoint_id: impl Into<String>) -> Self {
        Self {
            steps,
            checkpoint_id: checkpoint_id.into(),
        }
    }

    /// The nine-step pain assessment funnel.
    pub fn default_funnel() -> Self {
        let choice = |value: &str, label: &str, icon: &str, desc: &str| ChoiceOption {
            value: value.into(),
            label: label.into(),
            icon: icon.into(),
            description: desc.into(),
        };

        let steps = vec![
            StepDefinition {
                id: "age".into(),
                prompt: "What is your age range?".into(),
                subtitle: "Different ages call for different approaches".into(),
                kind: StepKind::Choice,
                options: vec![
                    choice("35-44", "35-44 years", "💪", "Active prevention phase"),
                    choice("45-54", "45-54 years", "🌟", "Maintenance period"),
                    choice("55-64", "55-64 years", "✨", "Specialized care"),
                    choice("65+", "65+ years", "👑", "Gentle, effective approach"),
                ],
            },
            StepDefinition {
                id: "pain_level".into(),
                prompt: "How intense is your pain?".into(),
                subtitle: "Rate it from 0 (no pain) to 10 (unbearable)".into(),
                kind: StepKind::Slider,
                options: Vec::new(),
            },
            StepDefinition {
                id: "main_problem".into(),
                prompt: "Where do you feel the most discomfort?".into(),
                subtitle: "Pick the area that bothers you most day to day".into(),
                kind: StepKind::Choice,
                options: vec![
                    choice("back", "Back region", "🔥", "Lower, mid or upper back"),
                    choice("neck", "Neck and shoulders", "💢", "Tension and stiffness"),
                    choice("joints", "Joints", "⚡", "Knees, hips, wrists"),
                    choice("mobility", "General mobility", "🚫", "Restricted movement"),
                ],
            },
            StepDefinition {
                id: "duration".into(),
                prompt: "How long have you had this pain?".into(),
                subtitle: "Duration directly shapes the treatment method".into(),
                kind: StepKind::Choice,
                options: vec![
                    choice("recent", "Less than 3 months", "🆕", "Acute pain, quick response"),
                    choice("moderate", "3 months to 1 year", "⏳", "Subacute pain, focused treatment"),
                    choice("chronic", "1 to 3 years", "📅", "Chronic pain, intensive approach"),
                    choice("longtime", "More than 3 years", "🔄", "Persistent pain, specialized method"),
                ],
            },
            StepDefinition {
                id: "previous_treatment".into(),
                prompt: "Have you tried any treatment before?".into(),
                subtitle: "This helps us understand your case better".into(),
                kind: StepKind::Choice,
                options: vec![
                    choice("none", "No treatment", "🆕", "First search for a solution"),
                    choice("some", "A few treatments", "💊", "Previous attempts"),
                    choice("multiple", "Several treatments", "🔄", "Looking for a definitive answer"),
                    choice("surgery", "Surgery", "🔪", "More complex case"),
                ],
            },
            StepDefinition {
                id: "email".into(),
                prompt: "Where should we send your personalized plan?".into(),
                subtitle: "Your results are ready to be unlocked".into(),
                kind: StepKind::Email,
                options: Vec::new(),
            },
            StepDefinition {
                id: "lifestyle".into(),
                prompt: "What is your lifestyle like?".into(),
                subtitle: "Your routine directly shapes the program".into(),
                kind: StepKind::Choice,
                options: vec![
                    choice("sedentary", "Sedentary", "💺", "Long hours sitting"),
                    choice("active", "Active", "🏃", "Regular movement"),
                    choice("standing", "On my feet", "👣", "Long hours standing"),
                    choice("mixed", "Mixed", "🔄", "A combination of activities"),
                ],
            },
            StepDefinition {
                id: "time_available".into(),
                prompt: "How much time do you have per day?".into(),
                subtitle: "We adjust the program intensity to fit".into(),
                kind: StepKind::Choice,
                options: vec![
                    choice("10min", "10 minutes", "⚡", "Express routine for busy days"),
                    choice("15min", "15 minutes", "🎯", "Ideal for consistent results"),
                    choice("20min", "20 minutes", "💪", "Commitment for faster results"),
                    choice("30min", "30+ minutes", "🔥", "Maximum dedication"),
                ],
            },
            StepDefinition {
                id: "investment".into(),
                prompt: "How much do you currently invest in your health?".into(),
                subtitle: "This helps us understand your priorities".into(),
                kind: StepKind::Choice,
                options: vec![
                    choice("yes", "I invest regularly", "💚", "Health comes first for me"),
                    choice("maybe", "Moderate investment", "🤔", "Looking for balance"),
                    choice("budget", "Basic investment", "💰", "Prevention focused"),
                    choice("unsure", "Not sure", "⏰", "Still weighing options"),
                ],
            },
        ];

        Self::new(steps, "previous_treatment")
    }

    /// `None` signals there are no more steps (the loading trigger).
    pub fn step_at(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn step_by_id(&self, id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Step id after which the analysis detour triggers.
    pub fn checkpoint_id(&self) -> &str {
        &self.checkpoint_id
    }

    pub fn last_index(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }
}

impl Default for StepCatalog {
    fn default() -> Self {
        Self::default_funnel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_funnel_has_9_steps() {
        let c = StepCatalog::default_funnel();
        assert_eq!(c.len(), 9);
    }

    #[test]
    fn email_step_sits_after_checkpoint() {
        let c = StepCatalog::default_funnel();
        assert_eq!(c.index_of("previous_treatment"), Some(4));
        assert_eq!(c.index_of("email"), Some(5));
        assert_eq!(c.step_at(5).unwrap().kind, StepKind::Email);
    }

    #[test]
    fn step_at_is_idempotent() {
        let c = StepCatalog::default_funnel();
        for i in 0..c.len() {
            assert_eq!(c.step_at(i), c.step_at(i));
        }
        assert!(c.step_at(c.len()).is_none());
    }

    #[test]
    fn choice_steps_carry_options() {
        let c = StepCatalog::default_funnel();
        for step in c.steps() {
            match step.kind {
                StepKind::Choice => assert_eq!(step.options.len(), 4, "step {}", step.id),
                _ => assert!(step.options.is_empty(), "step {}", step.id),
            }
        }
    }

    #[test]
    fn has_option_matches_values_only() {
        let c = StepCatalog::default_funnel();
        let age = c.step_by_id("age").unwrap();
        assert!(age.has_option("45-54"));
        assert!(!age.has_option("45-54 years"));
    }
}
