//! In-chat suggestions for helpers.

use crate::fallback;
use crate::llm::{ChatCompletion, ChatMessage, ChatRequest};
use crate::outcome::{FallbackReason, Outcome};
use std::sync::Arc;

/// Turns of history sent to the model.
pub const CONTEXT_TURNS: usize = 6;

const SUGGESTION_INSTRUCTION: &str = "Based on the conversation so far, suggest ONE short, warm response the helper could say. Start with 'Try: '";

#[derive(Clone)]
pub struct ScaffoldGenerator {
    ai: Option<Arc<dyn ChatCompletion>>,
}

impl ScaffoldGenerator {
    pub fn new(ai: Option<Arc<dyn ChatCompletion>>) -> Self {
        Self { ai }
    }

    pub async fn suggest(
        &self,
        mode: &str,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Outcome<String> {
        let fixed = || fallback::scaffold_suggestion(mode).to_string();
        let Some(ai) = &self.ai else {
            tracing::info!("scaffold: AI disabled, using fallback suggestion (mode={})", mode);
            return Outcome::fallback(fixed(), FallbackReason::Disabled);
        };

        match ai.complete(suggestion_request(system_prompt, messages)).await {
            Ok(suggestion) => {
                tracing::info!("scaffold completed (mode={})", mode);
                Outcome::Primary(suggestion.trim().to_string())
            }
            Err(e) => {
                tracing::warn!("scaffold AI call failed, using fallback: {}", e);
                Outcome::fallback(fixed(), FallbackReason::Transport(e.to_string()))
            }
        }
    }
}

/// System prompt, the last [`CONTEXT_TURNS`] turns, then the fixed instruction.
pub fn suggestion_request(system_prompt: &str, messages: &[ChatMessage]) -> ChatRequest {
    let recent = &messages[messages.len().saturating_sub(CONTEXT_TURNS)..];
    let mut history = Vec::with_capacity(recent.len() + 2);
    history.push(ChatMessage::system(system_prompt));
    history.extend_from_slice(recent);
    history.push(ChatMessage::user(SUGGESTION_INSTRUCTION));
    ChatRequest::new(history, 0.7).with_max_tokens(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn request_keeps_only_recent_turns() {
        let turns: Vec<ChatMessage> = (0..10).map(|i| ChatMessage::user(format!("turn {}", i))).collect();
        let req = suggestion_request("be kind", &turns);
        assert_eq!(req.messages.len(), CONTEXT_TURNS + 2);
        assert_eq!(req.messages[0], ChatMessage::system("be kind"));
        assert_eq!(req.messages[1].content, "turn 4");
        assert_eq!(req.messages[CONTEXT_TURNS].content, "turn 9");
        let last = req.messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert!(last.content.contains("Start with 'Try: '"));
        assert_eq!(req.max_tokens, Some(100));
    }

    #[test]
    fn short_history_is_sent_whole() {
        let turns = vec![ChatMessage::user("hi")];
        assert_eq!(suggestion_request("sys", &turns).messages.len(), 3);
    }

    #[tokio::test]
    async fn disabled_generator_uses_mode_table() {
        let out = ScaffoldGenerator::new(None).suggest("clarity", "sys", &[]).await;
        assert_eq!(out.value(), "Try: \"What feels most urgent to you right now?\"");
        assert!(out.is_fallback());
    }
}
