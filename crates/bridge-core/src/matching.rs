//! Matching orchestrator and explanation rules.
//!
//! Steps: embed the seeker if needed, select the candidate pool, delegate scoring to
//! the engine (top 5), derive `top_theme` and `explanation`, number the matches, and
//! sanitize the list for transport.

use crate::engine::{Breakdown, MatchingEngine};
use crate::outcome::{FallbackReason, Outcome};
use crate::pool::HelperPool;
use crate::profile::{HelperCard, SeekerProfile, Theme};
use crate::sanitize::{sanitize, Node};
use std::sync::Arc;

pub const MAX_MATCHES: usize = 5;

/// Ordered explanation rules: (breakdown dimension, threshold, clause). Every rule
/// whose value exceeds its threshold contributes its clause.
pub const EXPLANATION_RULES: [(&str, f32, &str); 4] = [
    ("emotional_similarity", 0.6, "deeply resonates with your emotional experience"),
    ("experience_overlap", 0.5, "has walked a similar path"),
    ("coping_style_match", 0.5, "supports the way you prefer to cope"),
    ("reliability_score", 0.8, "is a consistent and reliable listener"),
];

const DEFAULT_CLAUSE: &str = "has relevant experience to share";

/// One ranked match, still holding engine-native precision.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub match_id: String,
    pub helper_id: String,
    pub score: f32,
    pub breakdown: Breakdown,
    pub top_theme: Option<Theme>,
    pub explanation: String,
    pub helper: HelperCard,
}

impl MatchResult {
    pub fn to_node(&self) -> Node {
        let breakdown = Node::Map(
            self.breakdown
                .iter()
                .map(|(k, v)| (k.clone(), Node::F32(*v)))
                .collect(),
        );
        let helper = serde_json::to_value(&self.helper)
            .map(Node::from)
            .unwrap_or(Node::Null);
        let mut node = Node::map()
            .with("match_id", self.match_id.as_str())
            .with("helper_id", self.helper_id.as_str())
            .with("score", self.score)
            .with("breakdown", breakdown);
        if let Some(theme) = self.top_theme {
            node = node.with("top_theme", theme.name());
        }
        node.with("explanation", self.explanation.as_str())
            .with("helper", helper)
    }
}

/// `match_001`, `match_002`, ...
pub fn match_id(index: usize) -> String {
    format!("match_{:03}", index + 1)
}

pub fn explain(breakdown: &Breakdown) -> String {
    let clauses: Vec<&str> = EXPLANATION_RULES
        .iter()
        .filter(|(key, threshold, _)| breakdown.get(*key).copied().unwrap_or(0.0) > *threshold)
        .map(|(_, _, clause)| *clause)
        .collect();
    let body = if clauses.is_empty() {
        DEFAULT_CLAUSE.to_string()
    } else {
        clauses.join(", ")
    };
    format!("This person {}.", body)
}

/// Sanitized transport form of a match list.
pub fn to_payload(results: &[MatchResult]) -> Node {
    sanitize(Node::Seq(results.iter().map(MatchResult::to_node).collect()))
}

#[derive(Clone)]
pub struct MatchingOrchestrator {
    engine: Arc<dyn MatchingEngine>,
    pool: Arc<HelperPool>,
}

impl MatchingOrchestrator {
    pub fn new(engine: Arc<dyn MatchingEngine>, pool: Arc<HelperPool>) -> Self {
        Self { engine, pool }
    }

    /// Rank helpers for `seeker`. The seeker's embedding is computed (once) and cached
    /// on the profile when absent. Engine failures fall back to an empty list.
    pub fn rank(
        &self,
        seeker: &mut SeekerProfile,
        helper_ids: Option<&[String]>,
    ) -> Outcome<Vec<MatchResult>> {
        if seeker.emotion_embedding.is_none() {
            let text = seeker.vent_text.as_deref().unwrap_or("");
            match self.engine.embed(text) {
                Ok(embedding) => seeker.emotion_embedding = Some(embedding),
                Err(e) => {
                    tracing::warn!("match: embedding failed, returning no matches: {}", e);
                    return Outcome::fallback(Vec::new(), FallbackReason::Transport(e.to_string()));
                }
            }
        }

        let filtered;
        let candidates = match helper_ids {
            Some(ids) if !ids.is_empty() => {
                filtered = self.pool.filter_by_ids(ids);
                &filtered[..]
            }
            _ => self.pool.helpers(),
        };

        let ranked = match self.engine.score_all(seeker, candidates, MAX_MATCHES) {
            Ok(ranked) => ranked,
            Err(e) => {
                tracing::warn!("match: scoring failed, returning no matches: {}", e);
                return Outcome::fallback(Vec::new(), FallbackReason::Transport(e.to_string()));
            }
        };

        let results = ranked
            .into_iter()
            .take(MAX_MATCHES)
            .enumerate()
            .map(|(i, m)| MatchResult {
                match_id: match_id(i),
                top_theme: m.helper.top_theme(),
                explanation: explain(&m.breakdown),
                helper: m.helper.card(),
                helper_id: m.helper_id,
                score: m.score,
                breakdown: m.breakdown,
            })
            .collect::<Vec<_>>();

        tracing::info!("match completed (candidates={}, matches={})", candidates.len(), results.len());
        Outcome::Primary(results)
    }

    /// [`rank`](Self::rank) followed by sanitizing for transport.
    pub fn match_payload(
        &self,
        seeker: &mut SeekerProfile,
        helper_ids: Option<&[String]>,
    ) -> Outcome<Node> {
        self.rank(seeker, helper_ids).map(|results| to_payload(&results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(pairs: &[(&str, f32)]) -> Breakdown {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn explanation_includes_every_firing_rule() {
        let b = breakdown(&[
            ("emotional_similarity", 0.9),
            ("experience_overlap", 0.2),
            ("coping_style_match", 0.2),
            ("reliability_score", 0.9),
        ]);
        assert_eq!(
            explain(&b),
            "This person deeply resonates with your emotional experience, is a consistent and reliable listener."
        );
    }

    #[test]
    fn explanation_defaults_when_nothing_fires() {
        assert_eq!(explain(&Breakdown::new()), "This person has relevant experience to share.");
        let b = breakdown(&[("emotional_similarity", 0.6), ("reliability_score", 0.8)]);
        assert_eq!(explain(&b), "This person has relevant experience to share.");
    }

    #[test]
    fn explanation_keeps_rule_order() {
        let b = breakdown(&[
            ("reliability_score", 0.95),
            ("coping_style_match", 0.7),
            ("experience_overlap", 0.7),
            ("emotional_similarity", 0.7),
        ]);
        assert_eq!(
            explain(&b),
            "This person deeply resonates with your emotional experience, has walked a similar path, \
             supports the way you prefer to cope, is a consistent and reliable listener."
        );
    }

    #[test]
    fn match_ids_are_one_based_and_padded() {
        assert_eq!(match_id(0), "match_001");
        assert_eq!(match_id(11), "match_012");
    }
}
