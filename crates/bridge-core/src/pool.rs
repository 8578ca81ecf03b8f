//! Helper pool: synthetic helpers generated once at startup, read-only afterwards.
//!
//! The pool is a snapshot, not a database. It is built before the gateway serves its
//! first request and shared behind an `Arc`; nothing mutates it, so no lock is needed.

use crate::profile::{
    ApproachStyle, ConversationStyle, CopingStyle, EnergyLevel, HelperProfile, Theme, ThemeScore,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;

const DISPLAY_NAMES: &[&str] = &[
    "Alex", "Jordan", "Sam", "Riley", "Casey", "Morgan", "Taylor", "Jamie", "Avery", "Quinn",
    "Rowan", "Skyler", "Harper", "Emerson", "Finley", "Reese",
];

const AGE_DECADES: &[&str] = &["20s", "30s", "40s", "50s"];

/// Immutable collection of helpers, in generation order.
#[derive(Debug, Clone, Default)]
pub struct HelperPool {
    helpers: Vec<HelperProfile>,
}

/// Row of the debug listing.
#[derive(Debug, Clone, Serialize)]
pub struct HelperSummary {
    pub user_id: String,
    pub energy_level: EnergyLevel,
    pub reliability_score: f64,
    pub top_themes: Vec<(crate::profile::Theme, f64)>,
}

impl HelperPool {
    /// Seed `size` synthetic helpers. With `seed`, the pool is reproducible.
    pub fn seed(size: usize, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let helpers = (0..size).map(|i| generate_helper(i + 1, &mut rng)).collect();
        Self { helpers }
    }

    pub fn helpers(&self) -> &[HelperProfile] {
        &self.helpers
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.helpers.iter().map(|h| h.user_id.as_str()).collect()
    }

    /// Helpers whose id is in `ids`, in pool order.
    pub fn filter_by_ids(&self, ids: &[String]) -> Vec<HelperProfile> {
        self.helpers
            .iter()
            .filter(|h| ids.iter().any(|id| *id == h.user_id))
            .cloned()
            .collect()
    }

    pub fn summaries(&self) -> Vec<HelperSummary> {
        self.helpers
            .iter()
            .map(|h| HelperSummary {
                user_id: h.user_id.clone(),
                energy_level: h.energy_level,
                reliability_score: (h.reliability_score * 100.0).round() / 100.0,
                top_themes: h.top_themes(3),
            })
            .collect()
    }
}

fn generate_helper(index: usize, rng: &mut StdRng) -> HelperProfile {
    let theme_count = rng.gen_range(1..=3);
    let themes: Vec<Theme> = Theme::ALL
        .choose_multiple(rng, theme_count)
        .copied()
        .collect();

    let themes_experience: BTreeMap<Theme, f64> = themes
        .iter()
        .map(|t| (*t, round2(rng.gen_range(0.4..=1.0))))
        .collect();

    let coping_style_expertise: BTreeMap<CopingStyle, f64> = CopingStyle::ALL
        .iter()
        .map(|s| (*s, round2(rng.gen_range(0.0..=1.0))))
        .collect();

    let conversation_style: BTreeMap<ConversationStyle, f64> = ConversationStyle::ALL
        .iter()
        .map(|s| (*s, round2(rng.gen_range(0.0..=1.0))))
        .collect();

    let theme_scores = themes
        .iter()
        .map(|t| (*t, random_theme_score(rng)))
        .collect();

    let display_name = DISPLAY_NAMES
        .choose(rng)
        .copied()
        .unwrap_or("Anonymous Helper")
        .to_string();

    HelperProfile {
        user_id: format!("helper_{:03}", index),
        display_name,
        age_decade: AGE_DECADES.choose(rng).copied().unwrap_or("30s").to_string(),
        experience_narrative: Some(narrative_for(&themes)),
        themes_experience,
        coping_style_expertise,
        conversation_style,
        energy_level: *EnergyLevel::ALL.choose(rng).unwrap_or(&EnergyLevel::Moderate),
        reliability_score: round2(rng.gen_range(0.6..=1.0)),
        response_rate: round2(rng.gen_range(0.6..=1.0)),
        completion_rate: round2(rng.gen_range(0.6..=1.0)),
        theme_scores,
    }
}

fn random_theme_score(rng: &mut StdRng) -> ThemeScore {
    let approach = [ApproachStyle::Introvert, ApproachStyle::Extrovert, ApproachStyle::Balanced];
    ThemeScore {
        emotional_depth: round2(rng.gen_range(0.3..=1.0)),
        resilience_demonstrated: round2(rng.gen_range(0.3..=1.0)),
        approach_style: *approach.choose(rng).unwrap_or(&ApproachStyle::Balanced),
        coping_method: *CopingStyle::ALL.choose(rng).unwrap_or(&CopingStyle::EmotionFocused),
        communication_tone: *ConversationStyle::ALL
            .choose(rng)
            .unwrap_or(&ConversationStyle::ReflectiveListening),
        empathy_signal: round2(rng.gen_range(0.3..=1.0)),
        actionability: round2(rng.gen_range(0.3..=1.0)),
        self_awareness: round2(rng.gen_range(0.3..=1.0)),
    }
}

fn narrative_for(themes: &[Theme]) -> String {
    let names: Vec<&str> = themes.iter().map(|t| t.name()).collect();
    format!(
        "I went through {} and came out the other side. I know how lonely and overwhelming it can feel, and I want to listen.",
        names.join(" and ").to_lowercase()
    )
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn seeded_pool_is_reproducible() {
        let a = HelperPool::seed(12, Some(7));
        let b = HelperPool::seed(12, Some(7));
        assert_eq!(a.helpers(), b.helpers());
    }

    #[test]
    fn ids_are_unique_and_sequential() {
        let pool = HelperPool::seed(30, Some(1));
        assert_eq!(pool.len(), 30);
        assert_eq!(pool.helpers()[0].user_id, "helper_001");
        assert_eq!(pool.helpers()[29].user_id, "helper_030");
        let ids: BTreeSet<&str> = pool.ids().into_iter().collect();
        assert_eq!(ids.len(), 30);
    }

    #[test]
    fn generated_fields_stay_in_range() {
        let pool = HelperPool::seed(30, Some(3));
        for h in pool.helpers() {
            assert!(!h.themes_experience.is_empty() && h.themes_experience.len() <= 3);
            assert!(h.themes_experience.values().all(|v| (0.0..=1.0).contains(v)));
            assert!((0.6..=1.0).contains(&h.reliability_score));
            assert_eq!(h.theme_scores.len(), h.themes_experience.len());
            assert!(h
                .theme_scores
                .keys()
                .all(|t| h.themes_experience.contains_key(t)));
        }
    }

    #[test]
    fn filter_preserves_pool_order() {
        let pool = HelperPool::seed(10, Some(5));
        let picked = pool.filter_by_ids(&["helper_007".into(), "helper_002".into(), "nobody".into()]);
        let ids: Vec<&str> = picked.iter().map(|h| h.user_id.as_str()).collect();
        assert_eq!(ids, vec!["helper_002", "helper_007"]);
    }

    #[test]
    fn summaries_cap_top_themes() {
        let pool = HelperPool::seed(10, Some(9));
        for s in pool.summaries() {
            assert!(s.top_themes.len() <= 3);
            assert!(s.top_themes.windows(2).all(|w| w[0].1 >= w[1].1));
        }
    }
}
