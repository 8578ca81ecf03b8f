//! Wiring: one handle the gateway clones into its state.

use crate::config::BridgeConfig;
use crate::discovery::DiscoveryOrchestrator;
use crate::engine::MatchingEngine;
use crate::extraction::ProfileExtractor;
use crate::llm::{ChatCompletion, OpenAiChatClient};
use crate::matching::MatchingOrchestrator;
use crate::pool::HelperPool;
use crate::safety::SafetyGate;
use crate::scaffold::ScaffoldGenerator;
use std::sync::Arc;

/// All orchestrators over one shared helper pool and one pair of collaborators.
#[derive(Clone)]
pub struct Bridge {
    pub extractor: ProfileExtractor,
    pub safety: SafetyGate,
    pub scaffold: ScaffoldGenerator,
    pub matching: MatchingOrchestrator,
    pub discovery: DiscoveryOrchestrator,
    pool: Arc<HelperPool>,
    engine: Arc<dyn MatchingEngine>,
    ai_available: bool,
}

impl Bridge {
    pub fn new(
        ai: Option<Arc<dyn ChatCompletion>>,
        engine: Arc<dyn MatchingEngine>,
        pool: Arc<HelperPool>,
    ) -> Self {
        Self {
            extractor: ProfileExtractor::new(ai.clone()),
            safety: SafetyGate::new(ai.clone()),
            scaffold: ScaffoldGenerator::new(ai.clone()),
            matching: MatchingOrchestrator::new(engine.clone(), pool.clone()),
            discovery: DiscoveryOrchestrator::new(engine.clone(), pool.clone()),
            ai_available: ai.is_some(),
            pool,
            engine,
        }
    }

    /// Build from config: seeds the pool and decides, once, whether the AI path exists.
    pub fn from_config(config: &BridgeConfig, engine: Arc<dyn MatchingEngine>) -> Self {
        let ai = OpenAiChatClient::from_config(config).map(|c| {
            tracing::info!("AI client initialized (model={})", c.model());
            Arc::new(c) as Arc<dyn ChatCompletion>
        });
        if ai.is_none() {
            tracing::info!("No AI credential set; using deterministic fallbacks");
        }
        let pool = Arc::new(HelperPool::seed(config.helper_pool_size, config.helper_pool_seed));
        tracing::info!("Helper pool seeded: {} helpers", pool.len());
        Self::new(ai, engine, pool)
    }

    pub fn pool(&self) -> &HelperPool {
        &self.pool
    }

    pub fn ai_available(&self) -> bool {
        self.ai_available
    }

    pub fn embedding_mode(&self) -> &'static str {
        self.engine.embedding_mode()
    }
}
