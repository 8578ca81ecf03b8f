//! In-process matching engine with synthetic embeddings.

use super::{Breakdown, MatchingEngine, RankedMatch, ThemeRank};
use crate::error::EngineError;
use crate::profile::{ConversationStyle, CopingStyle, HelperProfile, SeekerProfile, Theme};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

pub const EMBEDDING_DIM: usize = 64;

const W_EMOTIONAL: f32 = 0.30;
const W_EXPERIENCE: f32 = 0.30;
const W_COPING: f32 = 0.15;
const W_CONVERSATION: f32 = 0.10;
const W_ENERGY: f32 = 0.05;
const W_RELIABILITY: f32 = 0.10;

/// Deterministic engine: token-hashed embeddings and cosine-based breakdowns.
#[derive(Debug, Clone, Default)]
pub struct LocalMatcher;

impl LocalMatcher {
    pub fn new() -> Self {
        Self
    }

    fn hashed_embedding(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % EMBEDDING_DIM as u64) as usize;
            let sign = if (h >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            v[idx] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }

    fn helper_text(helper: &HelperProfile) -> String {
        match helper.experience_narrative.as_deref() {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => helper
                .themes_experience
                .keys()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    fn breakdown(&self, seeker: &SeekerProfile, embedding: &[f32], helper: &HelperProfile) -> Breakdown {
        let helper_embedding = Self::hashed_embedding(&Self::helper_text(helper));
        let emotional = ((cosine(embedding, &helper_embedding) + 1.0) / 2.0).clamp(0.0, 1.0);

        let mut seeker_themes: BTreeMap<Theme, f64> = BTreeMap::new();
        for t in &seeker.themes {
            let slot = seeker_themes.entry(t.name).or_insert(0.0);
            *slot = slot.max(t.intensity);
        }
        let experience = cosine(
            &dense(&Theme::ALL, &seeker_themes),
            &dense(&Theme::ALL, &helper.themes_experience),
        )
        .clamp(0.0, 1.0);
        let coping = cosine(
            &dense(&CopingStyle::ALL, &seeker.coping_style_preference),
            &dense(&CopingStyle::ALL, &helper.coping_style_expertise),
        )
        .clamp(0.0, 1.0);
        let conversation = cosine(
            &dense(&ConversationStyle::ALL, &seeker.conversation_preference),
            &dense(&ConversationStyle::ALL, &helper.conversation_style),
        )
        .clamp(0.0, 1.0);
        let energy_gap = (seeker.energy_level.rank() as f32 - helper.energy_level.rank() as f32).abs();
        let energy = 1.0 - energy_gap / 3.0;
        let reliability =
            ((helper.reliability_score + helper.response_rate + helper.completion_rate) / 3.0) as f32;

        [
            ("emotional_similarity", emotional),
            ("experience_overlap", experience),
            ("coping_style_match", coping),
            ("conversation_match", conversation),
            ("energy_compatibility", energy),
            ("reliability_score", reliability.clamp(0.0, 1.0)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

impl MatchingEngine for LocalMatcher {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        Ok(Self::hashed_embedding(text))
    }

    fn score_all(
        &self,
        seeker: &SeekerProfile,
        helpers: &[HelperProfile],
        top_k: usize,
    ) -> Result<Vec<RankedMatch>, EngineError> {
        let embedding = seeker
            .emotion_embedding
            .as_deref()
            .ok_or_else(|| EngineError::Scoring("seeker has no emotion embedding".to_string()))?;
        if embedding.len() != EMBEDDING_DIM {
            return Err(EngineError::Scoring(format!(
                "embedding has {} dimensions, expected {}",
                embedding.len(),
                EMBEDDING_DIM
            )));
        }

        let mut ranked: Vec<RankedMatch> = helpers
            .iter()
            .map(|helper| {
                let breakdown = self.breakdown(seeker, embedding, helper);
                let get = |k: &str| breakdown.get(k).copied().unwrap_or(0.0);
                let score = W_EMOTIONAL * get("emotional_similarity")
                    + W_EXPERIENCE * get("experience_overlap")
                    + W_COPING * get("coping_style_match")
                    + W_CONVERSATION * get("conversation_match")
                    + W_ENERGY * get("energy_compatibility")
                    + W_RELIABILITY * get("reliability_score");
                RankedMatch {
                    score: score.clamp(0.0, 1.0),
                    helper_id: helper.user_id.clone(),
                    breakdown,
                    helper: helper.clone(),
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.helper_id.cmp(&b.helper_id))
        });
        ranked.truncate(top_k);
        Ok(ranked)
    }

    fn rank_by_theme(
        &self,
        theme: Theme,
        helpers: &[HelperProfile],
        top_k: usize,
    ) -> Result<Vec<ThemeRank>, EngineError> {
        let mut ranked: Vec<ThemeRank> = helpers
            .iter()
            .filter_map(|h| {
                let intensity = *h.themes_experience.get(&theme)?;
                let score = 0.8 * intensity + 0.2 * h.reliability_score;
                Some(ThemeRank {
                    score: score as f32,
                    helper_id: h.user_id.clone(),
                })
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.helper_id.cmp(&b.helper_id))
        });
        ranked.truncate(top_k);
        Ok(ranked)
    }

    fn embedding_mode(&self) -> &'static str {
        "synthetic"
    }
}

fn dense<K: Ord + Copy>(keys: &[K], weights: &BTreeMap<K, f64>) -> Vec<f32> {
    keys.iter()
        .map(|k| weights.get(k).copied().unwrap_or(0.0) as f32)
        .collect()
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}
