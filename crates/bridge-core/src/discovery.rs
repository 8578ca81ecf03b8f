//! Browse helpers by theme.

use crate::engine::MatchingEngine;
use crate::outcome::{FallbackReason, Outcome};
use crate::pool::HelperPool;
use crate::profile::Theme;
use crate::sanitize::canonical_decimal;
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_TOP_K: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveredHelper {
    pub helper_id: String,
    pub score: f64,
}

#[derive(Clone)]
pub struct DiscoveryOrchestrator {
    engine: Arc<dyn MatchingEngine>,
    pool: Arc<HelperPool>,
}

impl DiscoveryOrchestrator {
    pub fn new(engine: Arc<dyn MatchingEngine>, pool: Arc<HelperPool>) -> Self {
        Self { engine, pool }
    }

    /// Engine ranking over the whole pool, projected to `{helper_id, score}` in the
    /// engine's order.
    pub fn discover(&self, theme: Theme, top_k: usize) -> Outcome<Vec<DiscoveredHelper>> {
        match self.engine.rank_by_theme(theme, self.pool.helpers(), top_k) {
            Ok(ranked) => Outcome::Primary(
                ranked
                    .into_iter()
                    .map(|r| DiscoveredHelper {
                        score: canonical_decimal(r.score).unwrap_or(0.0),
                        helper_id: r.helper_id,
                    })
                    .collect(),
            ),
            Err(e) => {
                tracing::warn!("discover: ranking failed for {}: {}", theme, e);
                Outcome::fallback(Vec::new(), FallbackReason::Transport(e.to_string()))
            }
        }
    }
}
