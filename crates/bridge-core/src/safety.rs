//! Safety classifier gate: one-word risk label with a fail-safe default.
//!
//! Any failure (no credential, transport error, label outside the closed set) yields
//! `low`. Uncertainty never raises the risk level; a successful `medium`/`high` is
//! always passed through.

use crate::error::AiError;
use crate::fallback;
use crate::llm::{ChatCompletion, ChatMessage, ChatRequest};
use crate::outcome::{FallbackReason, Outcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const CLASSIFIER_PROMPT: &str = "You are a mental health risk classifier. Assess the following text for self-harm, \
suicidal ideation, or crisis indicators. Respond with ONLY one word: low, medium, or high.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Parse a raw model label: trimmed, case-insensitive, exact match only.
    pub fn from_label(label: &str) -> Option<RiskLevel> {
        match label.trim().to_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

#[derive(Clone)]
pub struct SafetyGate {
    ai: Option<Arc<dyn ChatCompletion>>,
}

impl SafetyGate {
    pub fn new(ai: Option<Arc<dyn ChatCompletion>>) -> Self {
        Self { ai }
    }

    pub async fn classify(&self, transcript: &str) -> Outcome<RiskLevel> {
        let Some(ai) = &self.ai else {
            tracing::info!("safety_check: AI disabled, defaulting to low");
            return Outcome::fallback(fallback::risk_level(), FallbackReason::Disabled);
        };

        let request = ChatRequest::new(
            vec![
                ChatMessage::system(CLASSIFIER_PROMPT),
                ChatMessage::user(transcript),
            ],
            0.0,
        )
        .with_max_tokens(5);

        match ai.complete(request).await {
            Ok(label) => match RiskLevel::from_label(&label) {
                Some(level) => {
                    tracing::info!("safety_check completed (risk_level={})", level.as_str());
                    Outcome::Primary(level)
                }
                None => {
                    tracing::error!("safety_check invalid model output: {:?}", label);
                    Outcome::fallback(fallback::risk_level(), FallbackReason::Anomaly(label))
                }
            },
            Err(AiError::EmptyReply) => {
                tracing::error!("safety_check invalid model output: empty reply");
                Outcome::fallback(fallback::risk_level(), FallbackReason::Anomaly(String::new()))
            }
            Err(e) => {
                tracing::error!("safety_check AI call failed, defaulting to low: {}", e);
                Outcome::fallback(fallback::risk_level(), FallbackReason::Transport(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct BlankModel;

    #[async_trait]
    impl ChatCompletion for BlankModel {
        async fn complete(&self, _request: ChatRequest) -> Result<String, AiError> {
            Err(AiError::EmptyReply)
        }
    }

    #[test]
    fn labels_are_trimmed_and_lowercased() {
        assert_eq!(RiskLevel::from_label(" HIGH\n"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_label("Medium"), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::from_label("high."), None);
        assert_eq!(RiskLevel::from_label("very high"), None);
    }

    #[tokio::test]
    async fn disabled_gate_is_low() {
        let out = SafetyGate::new(None).classify("anything").await;
        assert_eq!(out.value(), &RiskLevel::Low);
        assert_eq!(out.reason(), Some(&FallbackReason::Disabled));
    }

    #[tokio::test]
    async fn blank_reply_is_an_anomaly_not_an_outage() {
        let out = SafetyGate::new(Some(Arc::new(BlankModel))).classify("hmm").await;
        assert_eq!(out.value(), &RiskLevel::Low);
        assert_eq!(out.reason(), Some(&FallbackReason::Anomaly(String::new())));
    }
}
