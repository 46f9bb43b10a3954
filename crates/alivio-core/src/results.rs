//! Personalized results derived from the answer set.
//!
//! Pure selection logic over the collected answers: an archetype, up to two
//! insights, and the success probability for the score. The presentation
//! layer decides how (and whether) to render any of it.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

use crate::funnel::answers::AnswerSet;

/// Reader-facing persona selected from the answer combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
}

/// One personalized observation about the collected profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub text: String,
}

/// Everything the results stage needs from the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsProfile {
    pub archetype: Archetype,
    pub insights: Vec<Insight>,
    /// Percent, one of the fixed tiers.
    pub success_probability: u8,
}

/// Success probability tier for a final score.
pub fn success_probability(points: u32) -> u8 {
    if points > 200 {
        94
    } else if points > 150 {
        87
    } else {
        78
    }
}

impl ResultsProfile {
    pub fn derive(answers: &AnswerSet, points: u32) -> Self {
        Self {
            archetype: select_archetype(answers),
            insights: select_insights(answers),
            success_probability: success_probability(points),
        }
    }
}

fn archetype(id: &str, title: &str, subtitle: &str, description: &str) -> Archetype {
    Archetype {
        id: id.into(),
        title: title.into(),
        subtitle: subtitle.into(),
        description: description.into(),
    }
}

fn select_archetype(answers: &AnswerSet) -> Archetype {
    let pain = answers.scale("pain_level").unwrap_or(0);
    let age = answers.text("age").unwrap_or("");
    let problem = answers.text("main_problem").unwrap_or("");
    let duration = answers.text("duration").unwrap_or("");

    if pain >= 7 && duration == "longtime" {
        archetype(
            "relentless-fighter",
            "The Relentless Fighter",
            "You have faced this pain for years and never gave up",
            "People like you deserve a definitive answer, not another workaround",
        )
    } else if problem == "back" && age == "45-54" {
        archetype(
            "resilient-protector",
            "The Resilient Protector",
            "You take care of everyone, now it is your turn",
            "Prioritizing your own health keeps you strong for the people you love",
        )
    } else if pain <= 4 && duration == "recent" {
        archetype(
            "smart-strategist",
            "The Smart Strategist",
            "You act before the problem grows",
            "Your preventive attitude will make all the difference ahead",
        )
    } else if age == "55-64" || age == "65+" {
        archetype(
            "determined-sage",
            "The Determined Sage",
            "Experience taught you to look for what actually works",
            "A measured, proven approach fits exactly where you are",
        )
    } else {
        archetype(
            "steady-rebuilder",
            "The Steady Rebuilder",
            "You are ready to take back your routine",
            "Consistent, focused work is what turns your situation around",
        )
    }
}

fn insight(id: &str, text: &str) -> Insight {
    Insight {
        id: id.into(),
        text: text.into(),
    }
}

/// At most two insights, in rule order.
fn select_insights(answers: &AnswerSet) -> Vec<Insight> {
    let pain = answers.scale("pain_level").unwrap_or(0);
    let age = answers.text("age").unwrap_or("");
    let problem = answers.text("main_problem").unwrap_or("");
    let duration = answers.text("duration").unwrap_or("");
    let treatment = answers.text("previous_treatment").unwrap_or("");
    let lifestyle = answers.text("lifestyle").unwrap_or("");
    let investment = answers.text("investment").unwrap_or("");

    let mut insights = Vec::new();

    if age == "45-54" && pain >= 6 && duration == "chronic" {
        insights.push(insight(
            "overload-pattern",
            "Your profile matches the overload pattern: years of accumulated tension from caring for everyone but yourself.",
        ));
    } else if age == "35-44" && problem == "back" && lifestyle == "sedentary" {
        insights.push(insight(
            "desk-posture",
            "Age, desk work and back pain together point to the muscular compensation of long screen hours.",
        ));
    } else if pain >= 7 && duration == "longtime" {
        insights.push(insight(
            "adapted-chronic-pain",
            "Your body has built compensation mechanisms that, paradoxically, keep the problem in place.",
        ));
    }

    if treatment == "multiple" && pain >= 6 {
        insights.push(insight(
            "protocol-resistant",
            "Several treatments without lasting relief suggests resistance to standard protocols; your case needs a different angle.",
        ));
    } else if treatment == "none" && duration != "recent" && !duration.is_empty() {
        insights.push(insight(
            "normalized-pain",
            "You have normalized the pain for so long that living without it stopped feeling like an option.",
        ));
    }

    if lifestyle == "sedentary" && problem == "neck" {
        insights.push(insight(
            "tech-neck",
            "Sedentary work plus neck tension is the classic screen-posture pattern.",
        ));
    } else if lifestyle == "standing" && problem == "back" {
        insights.push(insight(
            "posterior-chain-overload",
            "Long standing hours plus back pain point to posterior-chain overload.",
        ));
    }

    if investment == "yes" && pain >= 6 {
        insights.push(insight(
            "ready-to-commit",
            "Your willingness to invest, combined with high pain, marks the ideal moment for change.",
        ));
    } else if investment == "budget" && duration == "longtime" {
        insights.push(insight(
            "at-the-limit",
            "Even on a tight budget you are looking for a way out after years of pain; you have reached the limit of tolerance.",
        ));
    }

    insights.truncate(2);
    insights
}

/// "People taking the assessment right now" counter.
///
/// Deterministic for a given seed so hosts can show a stable-but-moving
/// number within the reference bounds.
#[derive(Debug, Clone)]
pub struct SocialProof {
    base: u32,
    rng: Pcg64,
}

impl SocialProof {
    pub const MIN: u32 = 180;
    pub const MAX: u32 = 280;

    pub fn seeded(seed: u64) -> Self {
        let mut rng = Pcg64::seed_from_u64(seed);
        let base = rng.gen_range(200..250);
        Self { base, rng }
    }

    pub fn new() -> Self {
        Self::seeded(rand::random())
    }

    /// Current displayed count, jittering above the session base.
    pub fn current(&mut self) -> u32 {
        (self.base + self.rng.gen_range(0..10)).clamp(Self::MIN, Self::MAX)
    }
}

impl Default for SocialProof {
    fn default() -> Self {
        Self::new()
    }
}
