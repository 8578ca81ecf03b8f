//! bridge-core: profile extraction and peer matching for the Bridge support app.
//!
//! Every AI-backed operation is total: it returns an [`Outcome`], which carries either
//! the collaborator's value or a deterministic fallback plus the reason it was used.

pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod fallback;
pub mod llm;
pub mod matching;
pub mod outcome;
pub mod pool;
pub mod profile;
pub mod safety;
pub mod sanitize;
pub mod scaffold;
mod service;

pub use config::BridgeConfig;
pub use discovery::{DiscoveredHelper, DiscoveryOrchestrator};
pub use engine::{Breakdown, LocalMatcher, MatchingEngine, RankedMatch, ThemeRank};
pub use error::{AiError, EngineError, ValidationError};
pub use extraction::{ChatReply, ExtractionMode, HelperNarrative, ProfileExtractor};
pub use llm::{ChatCompletion, ChatMessage, ChatRequest, OpenAiChatClient, Role};
pub use matching::{MatchResult, MatchingOrchestrator};
pub use outcome::{FallbackReason, Outcome};
pub use pool::{HelperPool, HelperSummary};
pub use profile::{
    ApproachStyle, ConversationStyle, CopingStyle, DistressLevel, EnergyLevel, HelperCard,
    HelperExtraction, HelperProfile, SeekerProfile, Theme, ThemeIntensity, ThemeScore,
};
pub use safety::{RiskLevel, SafetyGate};
pub use sanitize::{sanitize, Node};
pub use scaffold::ScaffoldGenerator;
pub use service::Bridge;
