//! Profile extraction: seeker profiles, helper profiles and the onboarding chat.
//!
//! Each mode is total. A missing credential, a transport error, or a reply that does
//! not deserialize into the typed record yields the mode's deterministic fallback.

use crate::error::ValidationError;
use crate::fallback;
use crate::llm::{strip_code_fence, ChatCompletion, ChatMessage, ChatRequest};
use crate::outcome::{FallbackReason, Outcome};
use crate::profile::{
    ConversationStyle, CopingStyle, HelperExtraction, SeekerProfile, Theme,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

const ONBOARDING_PERSONA: &str = "You are a warm, empathetic mental-health onboarding assistant called Bridge. \
Your goal is to gently understand the user's situation in 3-4 exchanges, \
then say you'll find them someone who understands. Keep replies short (2-3 sentences).";

/// Which extraction conversation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    #[default]
    ExtractSeeker,
    ExtractHelper,
    SeekerChat,
    /// Any mode name not listed above; served as `extract_seeker`.
    #[serde(other)]
    Other,
}

/// Input for `extract_helper`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HelperNarrative {
    pub narrative: Option<String>,
    pub selected_themes: Vec<Theme>,
    pub theme_narratives: BTreeMap<Theme, String>,
}

impl HelperNarrative {
    /// Per-theme sections when present, else the flat narrative, then the theme list.
    pub fn combined_text(&self) -> String {
        let mut text = String::new();
        let sections: Vec<(&Theme, &str)> = self
            .theme_narratives
            .iter()
            .map(|(t, s)| (t, s.trim()))
            .filter(|(_, s)| !s.is_empty())
            .collect();
        if !self.theme_narratives.is_empty() {
            for (theme, story) in sections {
                text.push_str(&format!("\n\n## {}\n{}", theme, story));
            }
        } else if let Some(narrative) = &self.narrative {
            text.push_str(narrative);
        }
        if !self.selected_themes.is_empty() {
            let names: Vec<&str> = self.selected_themes.iter().map(|t| t.name()).collect();
            text.push_str(&format!("\n\nSelected themes: {}", names.join(", ")));
        }
        text
    }
}

/// Chat-mode reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

/// Drives the three extraction conversations against the AI collaborator.
#[derive(Clone)]
pub struct ProfileExtractor {
    ai: Option<Arc<dyn ChatCompletion>>,
}

impl ProfileExtractor {
    /// `ai = None` means no credential: every call returns its fallback immediately.
    pub fn new(ai: Option<Arc<dyn ChatCompletion>>) -> Self {
        Self { ai }
    }

    pub async fn extract_seeker(&self, transcript: &str) -> Outcome<SeekerProfile> {
        let vent_text = Some(transcript.to_string());
        let Some(ai) = &self.ai else {
            tracing::info!("extract_seeker: AI disabled, using fallback profile");
            return Outcome::fallback(fallback::seeker_profile(vent_text), FallbackReason::Disabled);
        };

        let request = ChatRequest::new(
            vec![
                ChatMessage::system(seeker_schema_prompt()),
                ChatMessage::user(transcript),
            ],
            0.3,
        );
        match structured::<SeekerProfile>(ai.as_ref(), request).await {
            Ok(mut profile) => {
                profile.vent_text = vent_text;
                profile.emotion_embedding = None;
                tracing::info!("extract_seeker completed");
                Outcome::Primary(profile)
            }
            Err(reason) => {
                log_fallback("extract_seeker", &reason);
                Outcome::fallback(fallback::seeker_profile(vent_text), reason)
            }
        }
    }

    pub async fn extract_helper(&self, input: &HelperNarrative) -> Outcome<HelperExtraction> {
        let Some(ai) = &self.ai else {
            tracing::info!("extract_helper: AI disabled, using heuristic profile");
            return Outcome::fallback(
                fallback::helper_profile(&input.selected_themes, &input.theme_narratives),
                FallbackReason::Disabled,
            );
        };

        let request = ChatRequest::new(
            vec![
                ChatMessage::system(helper_schema_prompt()),
                ChatMessage::user(input.combined_text()),
            ],
            0.3,
        );
        match structured::<HelperExtraction>(ai.as_ref(), request).await {
            Ok(profile) => {
                tracing::info!(
                    "extract_helper completed (theme_scores={})",
                    profile.theme_scores.len()
                );
                Outcome::Primary(profile)
            }
            Err(reason) => {
                log_fallback("extract_helper", &reason);
                Outcome::fallback(
                    fallback::helper_profile(&input.selected_themes, &input.theme_narratives),
                    reason,
                )
            }
        }
    }

    pub async fn seeker_chat(&self, messages: &[ChatMessage]) -> Outcome<ChatReply> {
        let scripted = || ChatReply {
            reply: fallback::seeker_chat_reply(messages).to_string(),
        };
        let Some(ai) = &self.ai else {
            tracing::info!("seeker_chat: AI disabled, using scripted reply");
            return Outcome::fallback(scripted(), FallbackReason::Disabled);
        };

        let mut history = Vec::with_capacity(messages.len() + 1);
        history.push(ChatMessage::system(ONBOARDING_PERSONA));
        history.extend_from_slice(messages);

        match ai.complete(ChatRequest::new(history, 0.7)).await {
            Ok(reply) => {
                tracing::info!("seeker_chat completed");
                Outcome::Primary(ChatReply {
                    reply: reply.trim().to_string(),
                })
            }
            Err(e) => {
                let reason = FallbackReason::Transport(e.to_string());
                log_fallback("seeker_chat", &reason);
                Outcome::fallback(scripted(), reason)
            }
        }
    }
}

/// One AI call whose reply must deserialize into `T`.
async fn structured<T: DeserializeOwned>(
    ai: &dyn ChatCompletion,
    request: ChatRequest,
) -> Result<T, FallbackReason> {
    let text = ai
        .complete(request)
        .await
        .map_err(|e| FallbackReason::Transport(e.to_string()))?;
    parse_reply(&text).map_err(|e| FallbackReason::Validation(e.to_string()))
}

/// Strip a wrapping code fence and deserialize into the typed record.
pub fn parse_reply<T: DeserializeOwned>(text: &str) -> Result<T, ValidationError> {
    Ok(serde_json::from_str(strip_code_fence(text))?)
}

fn log_fallback(op: &str, reason: &FallbackReason) {
    match reason {
        FallbackReason::Transport(_) => {
            tracing::warn!("{} AI call failed, using fallback ({})", op, reason)
        }
        _ => tracing::error!("{} AI reply rejected, using fallback ({})", op, reason),
    }
}

fn theme_names() -> String {
    let names: Vec<String> = Theme::ALL.iter().map(|t| format!("\"{}\"", t)).collect();
    format!("[{}]", names.join(", "))
}

fn coping_names() -> String {
    let names: Vec<String> = CopingStyle::ALL.iter().map(|s| format!("\"{}\"", s.as_str())).collect();
    format!("[{}]", names.join(", "))
}

fn conversation_names() -> String {
    let names: Vec<String> = ConversationStyle::ALL
        .iter()
        .map(|s| format!("\"{}\"", s.as_str()))
        .collect();
    format!("[{}]", names.join(", "))
}

fn seeker_schema_prompt() -> String {
    format!(
        "Extract a structured profile from this vent/narrative. Return ONLY valid JSON with:
- themes: list of {{\"name\": \"<one of {themes}>\", \"intensity\": 0.0-1.0}}
- coping_style_preference: {{\"problem_focused\": 0-1, \"emotion_focused\": 0-1, \"social_support\": 0-1, \"avoidant\": 0-1, \"meaning_making\": 0-1}}
- conversation_preference: {{\"direct_advice\": 0-1, \"reflective_listening\": 0-1, \"collaborative_problem_solving\": 0-1, \"validation_focused\": 0-1}}
- energy_level: one of [\"depleted\", \"low\", \"moderate\", \"high\"]
- distress_level: one of [\"Low\", \"Medium\", \"High\"]
- urgency: 0-1 float",
        themes = theme_names()
    )
}

fn helper_schema_prompt() -> String {
    let coping = coping_names();
    let conversation = conversation_names();
    format!(
        "You are an expert psychometric profiler for a peer-support matching platform.
Analyze the helper's per-theme narratives and score them on MIRRORED METRICS that match how seekers are scored.
This enables accurate helper-seeker cosine-similarity matching.

Return ONLY valid JSON with this structure:
{{
  \"themes\": [{{\"name\": \"<one of {themes}>\", \"intensity\": 0.0-1.0}}],
  \"coping_style\": \"<one of {coping}>\",
  \"communication_style\": \"<one of {conversation}>\",
  \"bio\": \"1-2 sentence bio summarizing their experience\",
  \"theme_scores\": {{
    \"<theme_name>\": {{
      \"emotional_depth\": 0.0-1.0,
      \"resilience_demonstrated\": 0.0-1.0,
      \"approach_style\": \"introvert|extrovert|balanced\",
      \"coping_method\": \"<one of {coping}>\",
      \"communication_tone\": \"<one of {conversation}>\",
      \"empathy_signal\": 0.0-1.0,
      \"actionability\": 0.0-1.0,
      \"self_awareness\": 0.0-1.0
    }}
  }}
}}

Scoring guide:
- emotional_depth: How deeply did they engage with the emotional reality? (0=surface, 1=profound)
- resilience_demonstrated: How much growth/recovery is evident? (0=still struggling, 1=fully processed)
- approach_style: introvert=internal reflection, extrovert=social coping, balanced=both
- coping_method: What strategy did they primarily use?
- communication_tone: How do they naturally communicate about difficult topics?
- empathy_signal: How well do they demonstrate understanding of others in similar situations?
- actionability: How practical/actionable is their experience? (0=abstract, 1=concrete steps)
- self_awareness: How self-aware are they about the experience? (0=unexamined, 1=deeply reflected)",
        themes = theme_names(),
    )
}
