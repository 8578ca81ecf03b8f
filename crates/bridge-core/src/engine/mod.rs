//! Matching engine interface: embedding, pairwise scoring and theme ranking.
//!
//! The engine is an external collaborator; the orchestrators only rely on the
//! contract below. Scores and breakdown values are engine-native `f32` and go through
//! the result sanitizer before they leave the process.

mod local;

pub use local::{LocalMatcher, EMBEDDING_DIM};

use crate::error::EngineError;
use crate::profile::{HelperProfile, SeekerProfile, Theme};
use std::collections::BTreeMap;

/// Per-dimension component scores of one match.
pub type Breakdown = BTreeMap<String, f32>;

/// One entry of `score_all`, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch {
    pub score: f32,
    pub helper_id: String,
    pub breakdown: Breakdown,
    pub helper: HelperProfile,
}

/// One entry of `rank_by_theme`, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeRank {
    pub score: f32,
    pub helper_id: String,
}

pub trait MatchingEngine: Send + Sync {
    /// Emotion embedding for free text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EngineError>;

    /// Score `helpers` against `seeker` and return at most `top_k` results, best first.
    fn score_all(
        &self,
        seeker: &SeekerProfile,
        helpers: &[HelperProfile],
        top_k: usize,
    ) -> Result<Vec<RankedMatch>, EngineError>;

    /// Rank `helpers` by relevance to `theme`, best first, at most `top_k`.
    fn rank_by_theme(
        &self,
        theme: Theme,
        helpers: &[HelperProfile],
        top_k: usize,
    ) -> Result<Vec<ThemeRank>, EngineError>;

    /// How embeddings are produced (reported by `/health`).
    fn embedding_mode(&self) -> &'static str;
}
