//! Deterministic, side-effect-free defaults used whenever the AI path cannot be.

use crate::llm::{ChatMessage, Role};
use crate::profile::{
    ApproachStyle, ConversationStyle, CopingStyle, DistressLevel, EnergyLevel, HelperExtraction,
    SeekerProfile, Theme, ThemeIntensity, ThemeScore,
};
use crate::safety::RiskLevel;
use std::collections::BTreeMap;

/// Scripted onboarding questions. The last entry is terminal: it hands off to matching.
pub const SEEKER_CHAT_SCRIPT: [&str; 4] = [
    "What's been on your mind lately? Take your time — there's no rush here.",
    "That sounds really heavy to carry. Can you tell me a bit more about what's been making it feel so overwhelming?",
    "I hear you. It takes courage to even say that out loud. How long has this been weighing on you?",
    "Thank you for sharing that with me. I'm going to find someone who truly understands what you're going through.",
];

pub const DEFAULT_HELPER_BIO: &str = "I've been through something similar and I'm here to listen.";

const DEFAULT_INTENSITY: f64 = 0.7;

/// Balanced default seeker profile.
pub fn seeker_profile(vent_text: Option<String>) -> SeekerProfile {
    SeekerProfile {
        themes: vec![ThemeIntensity {
            name: Theme::DEFAULT,
            intensity: DEFAULT_INTENSITY,
        }],
        coping_style_preference: CopingStyle::ALL.iter().map(|s| (*s, 0.5)).collect(),
        conversation_preference: ConversationStyle::ALL.iter().map(|s| (*s, 0.5)).collect(),
        energy_level: EnergyLevel::Low,
        distress_level: DistressLevel::Medium,
        urgency: 0.6,
        vent_text,
        emotion_embedding: None,
    }
}

/// Heuristic helper profile: the more a helper wrote about a theme, the deeper it scores.
pub fn helper_profile(
    selected_themes: &[Theme],
    theme_narratives: &BTreeMap<Theme, String>,
) -> HelperExtraction {
    let default_themes = [Theme::DEFAULT];
    let themes = if selected_themes.is_empty() {
        &default_themes[..]
    } else {
        selected_themes
    };

    let theme_scores = themes
        .iter()
        .map(|theme| {
            let narrative_len = theme_narratives
                .get(theme)
                .map(|n| n.trim().chars().count())
                .unwrap_or(0);
            (*theme, mirrored_score(narrative_len))
        })
        .collect();

    HelperExtraction {
        themes: themes
            .iter()
            .map(|t| ThemeIntensity {
                name: *t,
                intensity: DEFAULT_INTENSITY,
            })
            .collect(),
        coping_style: CopingStyle::EmotionFocused,
        communication_style: ConversationStyle::ReflectiveListening,
        bio: DEFAULT_HELPER_BIO.to_string(),
        theme_scores,
    }
}

/// depth = min(0.9, 0.4 + len/500); every other metric is a fixed multiple of depth.
fn mirrored_score(narrative_len: usize) -> ThemeScore {
    let depth = (0.4 + narrative_len as f64 / 500.0).min(0.9);
    ThemeScore {
        emotional_depth: round2(depth),
        resilience_demonstrated: round2(depth * 0.9),
        approach_style: ApproachStyle::Balanced,
        coping_method: CopingStyle::EmotionFocused,
        communication_tone: ConversationStyle::ReflectiveListening,
        empathy_signal: round2(depth * 0.85),
        actionability: round2(depth * 0.7),
        self_awareness: round2(depth * 0.8),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Next scripted onboarding reply, indexed by how many turns the user has written.
pub fn seeker_chat_reply(messages: &[ChatMessage]) -> &'static str {
    let user_turns = messages.iter().filter(|m| m.role == Role::User).count();
    SEEKER_CHAT_SCRIPT[user_turns.min(SEEKER_CHAT_SCRIPT.len() - 1)]
}

/// Pre-written scaffold suggestion for a conversation mode; unknown modes use `vent`.
pub fn scaffold_suggestion(mode: &str) -> &'static str {
    match mode {
        "reflect" => "Try: \"It sounds like you're feeling really unseen. Is that right?\"",
        "clarity" => "Try: \"What feels most urgent to you right now?\"",
        "growth" => "Try: \"What's one small thing that might make tomorrow slightly better?\"",
        _ => "Try: \"I'm here. Take all the time you need.\"",
    }
}

pub fn risk_level() -> RiskLevel {
    RiskLevel::Low
}
