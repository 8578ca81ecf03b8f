//! Orchestration tests: every AI-backed operation must stay total, and matching must
//! honour its ranking and explanation contract.
//!
//! Run with: `cargo test -p bridge-core --test orchestration_test`

use async_trait::async_trait;
use bridge_core::fallback::SEEKER_CHAT_SCRIPT;
use bridge_core::{
    AiError, Bridge, ChatCompletion, ChatMessage, ChatRequest, EngineError, FallbackReason,
    HelperNarrative, HelperPool, HelperProfile, LocalMatcher, MatchingEngine, Node, Outcome,
    RankedMatch, RiskLevel, Role, SeekerProfile, Theme, ThemeRank,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Chat client that replays one canned reply (or error) and records every request.
struct ScriptedChat {
    reply: Result<String, String>,
    seen: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err("connection refused".to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompletion for ScriptedChat {
    async fn complete(&self, request: ChatRequest) -> Result<String, AiError> {
        self.seen.lock().unwrap().push(request);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(AiError::Status(503, e.clone())),
        }
    }
}

/// Wraps the local engine and counts embedding calls.
#[derive(Default)]
struct CountingEngine {
    inner: LocalMatcher,
    embeds: AtomicUsize,
    seen_embedding: Mutex<Option<Vec<f32>>>,
    fail_scoring: bool,
}

impl MatchingEngine for CountingEngine {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        self.embeds.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text)
    }

    fn score_all(
        &self,
        seeker: &SeekerProfile,
        helpers: &[HelperProfile],
        top_k: usize,
    ) -> Result<Vec<RankedMatch>, EngineError> {
        *self.seen_embedding.lock().unwrap() = seeker.emotion_embedding.clone();
        if self.fail_scoring {
            return Err(EngineError::Scoring("engine offline".into()));
        }
        self.inner.score_all(seeker, helpers, top_k)
    }

    fn rank_by_theme(
        &self,
        theme: Theme,
        helpers: &[HelperProfile],
        top_k: usize,
    ) -> Result<Vec<ThemeRank>, EngineError> {
        self.inner.rank_by_theme(theme, helpers, top_k)
    }

    fn embedding_mode(&self) -> &'static str {
        "counting"
    }
}

fn pool() -> Arc<HelperPool> {
    Arc::new(HelperPool::seed(30, Some(2024)))
}

fn bridge_with(ai: Option<Arc<dyn ChatCompletion>>) -> Bridge {
    Bridge::new(ai, Arc::new(LocalMatcher::new()), pool())
}

fn seeker(vent: &str) -> SeekerProfile {
    let mut s = bridge_core::fallback::seeker_profile(Some(vent.to_string()));
    s.themes[0].name = Theme::ExamStress;
    s
}

// ---------------------------------------------------------------------------
// extract_seeker
// ---------------------------------------------------------------------------

#[tokio::test]
async fn extract_seeker_parses_fenced_reply() {
    let chat = ScriptedChat::replying(
        "```json\n{\"themes\":[{\"name\":\"Loneliness\",\"intensity\":0.9}],\
         \"coping_style_preference\":{\"social_support\":0.8},\
         \"conversation_preference\":{\"validation_focused\":0.7},\
         \"energy_level\":\"depleted\",\"distress_level\":\"High\",\"urgency\":0.8}\n```",
    );
    let bridge = bridge_with(Some(chat.clone()));
    let out = bridge.extractor.extract_seeker("nobody calls me anymore").await;

    let Outcome::Primary(profile) = out else {
        panic!("expected AI profile, got {:?}", out);
    };
    assert_eq!(profile.themes[0].name, Theme::Loneliness);
    assert_eq!(profile.vent_text.as_deref(), Some("nobody calls me anymore"));

    let sent = chat.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].messages[0].role, Role::System);
    assert_eq!(sent[0].messages[1], ChatMessage::user("nobody calls me anymore"));
}

#[tokio::test]
async fn extract_seeker_falls_back_on_malformed_reply() {
    let bridge = bridge_with(Some(ScriptedChat::replying("Sure! Here is the profile you asked for.")));
    let out = bridge.extractor.extract_seeker("rough week").await;
    assert!(matches!(out.reason(), Some(FallbackReason::Validation(_))));
    let p = out.into_value();
    assert_eq!(p.themes[0].name, Theme::FamilyProblems);
    assert_eq!(p.urgency, 0.6);
    assert_eq!(p.vent_text.as_deref(), Some("rough week"));
}

#[tokio::test]
async fn extract_seeker_falls_back_on_out_of_set_enum() {
    let bridge = bridge_with(Some(ScriptedChat::replying(
        "{\"themes\":[{\"name\":\"Grief\",\"intensity\":0.5}],\"coping_style_preference\":{},\
         \"conversation_preference\":{},\"energy_level\":\"wired\",\"distress_level\":\"Low\",\"urgency\":0.1}",
    )));
    let out = bridge.extractor.extract_seeker("x").await;
    assert!(matches!(out.reason(), Some(FallbackReason::Validation(_))));
}

#[tokio::test]
async fn extract_seeker_falls_back_on_transport_error() {
    let bridge = bridge_with(Some(ScriptedChat::failing()));
    let out = bridge.extractor.extract_seeker("x").await;
    assert!(matches!(out.reason(), Some(FallbackReason::Transport(_))));
}

// ---------------------------------------------------------------------------
// extract_helper
// ---------------------------------------------------------------------------

#[tokio::test]
async fn extract_helper_fallback_scores_exam_stress_exactly() {
    let bridge = bridge_with(None);
    let input = HelperNarrative {
        narrative: None,
        selected_themes: vec![Theme::ExamStress],
        theme_narratives: [(Theme::ExamStress, "a".repeat(250))].into_iter().collect(),
    };
    let out = bridge.extractor.extract_helper(&input).await;
    assert_eq!(out.reason(), Some(&FallbackReason::Disabled));
    let score = &out.value().theme_scores[&Theme::ExamStress];
    assert!((score.emotional_depth - 0.9).abs() < 1e-9);
    assert!((score.resilience_demonstrated - 0.81).abs() < 1e-9);
}

#[tokio::test]
async fn extract_helper_sends_combined_text() {
    let chat = ScriptedChat::failing();
    let bridge = bridge_with(Some(chat.clone()));
    let input = HelperNarrative {
        narrative: Some("unused".into()),
        selected_themes: vec![Theme::Grief],
        theme_narratives: [(Theme::Grief, "My mother passed in 2019.".to_string())]
            .into_iter()
            .collect(),
    };
    let out = bridge.extractor.extract_helper(&input).await;
    assert!(out.is_fallback());
    let user = &chat.requests()[0].messages[1];
    assert!(user.content.contains("## Grief\nMy mother passed in 2019."));
    assert!(user.content.contains("Selected themes: Grief"));
}

#[tokio::test]
async fn extract_helper_accepts_valid_reply() {
    let reply = serde_json::json!({
        "themes": [{"name": "Work Burnout", "intensity": 0.8}],
        "coping_style": "problem_focused",
        "communication_style": "direct_advice",
        "bio": "Burned out at 30, rebuilt slowly.",
        "theme_scores": {
            "Work Burnout": {
                "emotional_depth": 0.7,
                "resilience_demonstrated": 0.8,
                "approach_style": "introvert",
                "coping_method": "problem_focused",
                "communication_tone": "direct_advice",
                "empathy_signal": 0.6,
                "actionability": 0.9,
                "self_awareness": 0.75
            }
        }
    });
    let bridge = bridge_with(Some(ScriptedChat::replying(&reply.to_string())));
    let out = bridge.extractor.extract_helper(&HelperNarrative::default()).await;
    assert!(!out.is_fallback());
    assert_eq!(out.value().bio, "Burned out at 30, rebuilt slowly.");
}

// ---------------------------------------------------------------------------
// seeker_chat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn seeker_chat_script_is_used_without_ai() {
    let bridge = bridge_with(None);
    let first = bridge.extractor.seeker_chat(&[]).await.into_value();
    assert_eq!(first.reply, SEEKER_CHAT_SCRIPT[0]);

    let turns: Vec<ChatMessage> = (0..5).map(|i| ChatMessage::user(format!("turn {}", i))).collect();
    let terminal = bridge.extractor.seeker_chat(&turns).await.into_value();
    assert_eq!(terminal.reply, SEEKER_CHAT_SCRIPT[3]);
}

#[tokio::test]
async fn seeker_chat_prepends_persona() {
    let chat = ScriptedChat::replying("  That sounds hard. What happened?  ");
    let bridge = bridge_with(Some(chat.clone()));
    let turns = vec![ChatMessage::user("I failed my exam")];
    let out = bridge.extractor.seeker_chat(&turns).await;
    assert_eq!(out.value().reply, "That sounds hard. What happened?");
    let sent = &chat.requests()[0];
    assert_eq!(sent.messages.len(), 2);
    assert!(sent.messages[0].content.contains("3-4 exchanges"));
}

// ---------------------------------------------------------------------------
// safety_check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn safety_passes_through_high() {
    let chat = ScriptedChat::replying("High");
    let out = bridge_with(Some(chat.clone())).safety.classify("I can't go on").await;
    assert_eq!(out, Outcome::Primary(RiskLevel::High));
    assert_eq!(chat.requests()[0].max_tokens, Some(5));
    assert_eq!(chat.requests()[0].temperature, 0.0);
}

#[tokio::test]
async fn safety_coerces_anomaly_to_low() {
    let out = bridge_with(Some(ScriptedChat::replying("elevated")))
        .safety
        .classify("hmm")
        .await;
    assert_eq!(out.value(), &RiskLevel::Low);
    assert_eq!(out.reason(), Some(&FallbackReason::Anomaly("elevated".into())));
}

#[tokio::test]
async fn safety_transport_failure_is_low() {
    let out = bridge_with(Some(ScriptedChat::failing())).safety.classify("hmm").await;
    assert_eq!(out.value(), &RiskLevel::Low);
    assert!(matches!(out.reason(), Some(FallbackReason::Transport(_))));
}

// ---------------------------------------------------------------------------
// scaffold
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scaffold_falls_back_per_mode_on_failure() {
    let bridge = bridge_with(Some(ScriptedChat::failing()));
    let out = bridge.scaffold.suggest("reflect", "sys", &[]).await;
    assert_eq!(
        out.value(),
        "Try: \"It sounds like you're feeling really unseen. Is that right?\""
    );
}

#[tokio::test]
async fn scaffold_returns_model_text() {
    let bridge = bridge_with(Some(ScriptedChat::replying("Try: \"That must be exhausting.\"")));
    let out = bridge.scaffold.suggest("vent", "sys", &[ChatMessage::user("ugh")]).await;
    assert_eq!(out, Outcome::Primary("Try: \"That must be exhausting.\"".to_string()));
}

#[tokio::test]
async fn scaffold_trims_model_padding() {
    let bridge = bridge_with(Some(ScriptedChat::replying("  Try: \"I'm listening.\"\n")));
    let out = bridge.scaffold.suggest("vent", "sys", &[]).await;
    assert_eq!(out, Outcome::Primary("Try: \"I'm listening.\"".to_string()));
}

// ---------------------------------------------------------------------------
// match / discover
// ---------------------------------------------------------------------------

#[test]
fn match_embeds_exactly_once_and_passes_embedding_downstream() {
    let engine = Arc::new(CountingEngine::default());
    let bridge = Bridge::new(None, engine.clone(), pool());
    let mut s = seeker("exams are crushing me");
    assert!(s.emotion_embedding.is_none());

    let out = bridge.matching.rank(&mut s, None);
    assert!(!out.is_fallback());
    assert_eq!(engine.embeds.load(Ordering::SeqCst), 1);
    assert!(s.emotion_embedding.is_some());
    assert_eq!(*engine.seen_embedding.lock().unwrap(), s.emotion_embedding);

    // Cached embedding is reused.
    bridge.matching.rank(&mut s, None);
    assert_eq!(engine.embeds.load(Ordering::SeqCst), 1);
}

#[test]
fn match_returns_at_most_five_well_formed_results() {
    let bridge = bridge_with(None);
    let mut s = seeker("I feel lost after my breakup");
    let results = bridge.matching.rank(&mut s, None).into_value();
    assert_eq!(results.len(), 5);
    for (i, m) in results.iter().enumerate() {
        assert_eq!(m.match_id, format!("match_{:03}", i + 1));
        assert!((0.0..=1.0).contains(&m.score));
        assert!(m.breakdown.values().all(|v| (0.0..=1.0).contains(v)));
        assert!(m.explanation.starts_with("This person "));
        assert!(m.explanation.ends_with('.'));
        let theme = m.top_theme.expect("pool helpers always have themes");
        assert!(m.helper.themes_experience.contains_key(&theme));
        assert_eq!(m.helper_id, m.helper.user_id);
    }
}

#[test]
fn match_respects_allow_list() {
    let bridge = bridge_with(None);
    let mut s = seeker("anything");
    let ids = vec!["helper_004".to_string(), "helper_017".to_string()];
    let results = bridge.matching.rank(&mut s, Some(&ids)).into_value();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|m| ids.contains(&m.helper_id)));
}

#[test]
fn match_engine_failure_yields_empty_list() {
    let engine = Arc::new(CountingEngine {
        fail_scoring: true,
        ..Default::default()
    });
    let bridge = Bridge::new(None, engine, pool());
    let out = bridge.matching.rank(&mut seeker("x"), None);
    assert!(matches!(out.reason(), Some(FallbackReason::Transport(_))));
    assert!(out.value().is_empty());
}

#[test]
fn match_payload_is_canonical() {
    let bridge = bridge_with(None);
    let payload = bridge.matching.match_payload(&mut seeker("exam panic"), None).into_value();
    assert!(payload.is_canonical());
    assert_eq!(bridge_core::sanitize(payload.clone()), payload);

    let Node::Seq(items) = &payload else {
        panic!("expected a list");
    };
    assert_eq!(items[0].get("match_id").and_then(Node::as_str), Some("match_001"));
    assert!(items[0].get("helper").and_then(|h| h.get("theme_scores")).is_none());

    let json = serde_json::to_value(&payload).unwrap();
    assert!(json[0]["score"].is_f64());
}

#[test]
fn discover_preserves_engine_order() {
    let bridge = bridge_with(None);
    let helpers = bridge.discovery.discover(Theme::Anxiety, 3).into_value();
    assert!(helpers.len() <= 3);
    assert!(helpers.windows(2).all(|w| w[0].score >= w[1].score));
    let direct = LocalMatcher::new()
        .rank_by_theme(Theme::Anxiety, bridge.pool().helpers(), 3)
        .unwrap();
    let ids: Vec<&str> = helpers.iter().map(|h| h.helper_id.as_str()).collect();
    let expected: Vec<&str> = direct.iter().map(|r| r.helper_id.as_str()).collect();
    assert_eq!(ids, expected);
}

#[test]
fn pool_is_untouched_by_requests() {
    let bridge = bridge_with(None);
    let before: Vec<HelperProfile> = bridge.pool().helpers().to_vec();
    let mut s = seeker("x");
    bridge.matching.rank(&mut s, None);
    bridge.discovery.discover(Theme::Grief, 10);
    assert_eq!(bridge.pool().helpers(), &before[..]);
}
