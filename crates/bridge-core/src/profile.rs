//! Seeker and helper profile records.
//!
//! Closed-set fields (themes, coping and conversation styles, energy, distress) are
//! enums so an AI reply that names anything outside the sets fails to deserialize and
//! is treated as a validation failure by the orchestrators.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Life-situation category shared by seekers and helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Theme {
    #[serde(rename = "Exam Stress")]
    ExamStress,
    #[serde(rename = "Family Problems")]
    FamilyProblems,
    #[serde(rename = "Breakup")]
    Breakup,
    #[serde(rename = "Loneliness")]
    Loneliness,
    #[serde(rename = "Grief")]
    Grief,
    #[serde(rename = "Work Burnout")]
    WorkBurnout,
    #[serde(rename = "Anxiety")]
    Anxiety,
    #[serde(rename = "Identity")]
    Identity,
    #[serde(rename = "Financial Stress")]
    FinancialStress,
    #[serde(rename = "Health Issues")]
    HealthIssues,
}

impl Theme {
    pub const ALL: [Theme; 10] = [
        Theme::ExamStress,
        Theme::FamilyProblems,
        Theme::Breakup,
        Theme::Loneliness,
        Theme::Grief,
        Theme::WorkBurnout,
        Theme::Anxiety,
        Theme::Identity,
        Theme::FinancialStress,
        Theme::HealthIssues,
    ];

    /// Theme used when nothing better is known (fallback profiles).
    pub const DEFAULT: Theme = Theme::FamilyProblems;

    pub fn name(self) -> &'static str {
        match self {
            Theme::ExamStress => "Exam Stress",
            Theme::FamilyProblems => "Family Problems",
            Theme::Breakup => "Breakup",
            Theme::Loneliness => "Loneliness",
            Theme::Grief => "Grief",
            Theme::WorkBurnout => "Work Burnout",
            Theme::Anxiety => "Anxiety",
            Theme::Identity => "Identity",
            Theme::FinancialStress => "Financial Stress",
            Theme::HealthIssues => "Health Issues",
        }
    }

    /// Case-insensitive lookup by display name.
    pub fn from_name(name: &str) -> Option<Theme> {
        let wanted = name.trim();
        Theme::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopingStyle {
    ProblemFocused,
    EmotionFocused,
    SocialSupport,
    Avoidant,
    MeaningMaking,
}

impl CopingStyle {
    pub const ALL: [CopingStyle; 5] = [
        CopingStyle::ProblemFocused,
        CopingStyle::EmotionFocused,
        CopingStyle::SocialSupport,
        CopingStyle::Avoidant,
        CopingStyle::MeaningMaking,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CopingStyle::ProblemFocused => "problem_focused",
            CopingStyle::EmotionFocused => "emotion_focused",
            CopingStyle::SocialSupport => "social_support",
            CopingStyle::Avoidant => "avoidant",
            CopingStyle::MeaningMaking => "meaning_making",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStyle {
    DirectAdvice,
    ReflectiveListening,
    CollaborativeProblemSolving,
    ValidationFocused,
}

impl ConversationStyle {
    pub const ALL: [ConversationStyle; 4] = [
        ConversationStyle::DirectAdvice,
        ConversationStyle::ReflectiveListening,
        ConversationStyle::CollaborativeProblemSolving,
        ConversationStyle::ValidationFocused,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConversationStyle::DirectAdvice => "direct_advice",
            ConversationStyle::ReflectiveListening => "reflective_listening",
            ConversationStyle::CollaborativeProblemSolving => "collaborative_problem_solving",
            ConversationStyle::ValidationFocused => "validation_focused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Depleted,
    Low,
    Moderate,
    High,
}

impl EnergyLevel {
    pub const ALL: [EnergyLevel; 4] = [
        EnergyLevel::Depleted,
        EnergyLevel::Low,
        EnergyLevel::Moderate,
        EnergyLevel::High,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EnergyLevel::Depleted => "depleted",
            EnergyLevel::Low => "low",
            EnergyLevel::Moderate => "moderate",
            EnergyLevel::High => "high",
        }
    }

    /// Position on the depleted..high scale (0..=3).
    pub fn rank(self) -> u8 {
        match self {
            EnergyLevel::Depleted => 0,
            EnergyLevel::Low => 1,
            EnergyLevel::Moderate => 2,
            EnergyLevel::High => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistressLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApproachStyle {
    Introvert,
    Extrovert,
    Balanced,
}

/// One theme with its intensity in [0,1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeIntensity {
    pub name: Theme,
    pub intensity: f64,
}

/// Structured seeker profile, produced by `extract_seeker` and consumed by `match`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeekerProfile {
    pub themes: Vec<ThemeIntensity>,
    pub coping_style_preference: BTreeMap<CopingStyle, f64>,
    pub conversation_preference: BTreeMap<ConversationStyle, f64>,
    pub energy_level: EnergyLevel,
    pub distress_level: DistressLevel,
    pub urgency: f64,
    /// Raw narrative the profile was extracted from; embedded on demand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vent_text: Option<String>,
    /// Cached emotion embedding, filled in by the matching orchestrator when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_embedding: Option<Vec<f32>>,
}

/// Mirrored eight-metric self-assessment of a helper for one theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeScore {
    pub emotional_depth: f64,
    pub resilience_demonstrated: f64,
    pub approach_style: ApproachStyle,
    pub coping_method: CopingStyle,
    pub communication_tone: ConversationStyle,
    pub empathy_signal: f64,
    pub actionability: f64,
    pub self_awareness: f64,
}

/// Helper profile as produced by `extract_helper`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperExtraction {
    pub themes: Vec<ThemeIntensity>,
    pub coping_style: CopingStyle,
    pub communication_style: ConversationStyle,
    pub bio: String,
    pub theme_scores: BTreeMap<Theme, ThemeScore>,
}

/// A helper in the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperProfile {
    pub user_id: String,
    pub display_name: String,
    pub age_decade: String,
    pub themes_experience: BTreeMap<Theme, f64>,
    pub coping_style_expertise: BTreeMap<CopingStyle, f64>,
    pub conversation_style: BTreeMap<ConversationStyle, f64>,
    pub energy_level: EnergyLevel,
    pub reliability_score: f64,
    pub response_rate: f64,
    pub completion_rate: f64,
    pub experience_narrative: Option<String>,
    pub theme_scores: BTreeMap<Theme, ThemeScore>,
}

impl HelperProfile {
    /// Theme with the highest intensity; ties go to the lexicographically smallest
    /// theme name so the answer does not depend on map iteration order.
    pub fn top_theme(&self) -> Option<Theme> {
        self.themes_experience
            .iter()
            .fold(None, |best: Option<(Theme, f64)>, (&theme, &intensity)| match best {
                Some((b, bi))
                    if bi > intensity || (bi == intensity && b.name() <= theme.name()) =>
                {
                    Some((b, bi))
                }
                _ => Some((theme, intensity)),
            })
            .map(|(t, _)| t)
    }

    /// Up to `n` themes ordered by intensity, highest first.
    pub fn top_themes(&self, n: usize) -> Vec<(Theme, f64)> {
        let mut themes: Vec<(Theme, f64)> = self
            .themes_experience
            .iter()
            .map(|(t, i)| (*t, *i))
            .collect();
        themes.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.name().cmp(b.0.name())));
        themes.truncate(n);
        themes
    }

    /// Projection returned to clients: everything except internal scoring fields.
    pub fn card(&self) -> HelperCard {
        HelperCard {
            user_id: self.user_id.clone(),
            display_name: self.display_name.clone(),
            age_decade: self.age_decade.clone(),
            themes_experience: self.themes_experience.clone(),
            coping_style_expertise: self.coping_style_expertise.clone(),
            conversation_style: self.conversation_style.clone(),
            energy_level: self.energy_level,
            reliability_score: self.reliability_score,
            response_rate: self.response_rate,
            completion_rate: self.completion_rate,
            experience_narrative: self.experience_narrative.clone(),
        }
    }
}

/// Redacted helper projection attached to each match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperCard {
    pub user_id: String,
    pub display_name: String,
    pub age_decade: String,
    pub themes_experience: BTreeMap<Theme, f64>,
    pub coping_style_expertise: BTreeMap<CopingStyle, f64>,
    pub conversation_style: BTreeMap<ConversationStyle, f64>,
    pub energy_level: EnergyLevel,
    pub reliability_score: f64,
    pub response_rate: f64,
    pub completion_rate: f64,
    pub experience_narrative: Option<String>,
}
