//! Process configuration loaded from the environment (and `.env`, loaded by the gateway).
//!
//! Read once at startup. The presence of an AI credential fixes, for the whole process
//! lifetime, whether AI-backed paths are attempted at all.

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_HELPER_POOL_SIZE: usize = 30;

/// Bridge configuration.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | BRIDGE_BIND_ADDR | 0.0.0.0:8000 | Gateway listen address. |
/// | OPENAI_API_KEY / OPENROUTER_API_KEY | unset | AI credential. Unset or blank => deterministic fallbacks only. |
/// | BRIDGE_LLM_BASE_URL | https://api.openai.com/v1 | OpenAI-compatible base URL. |
/// | BRIDGE_LLM_MODEL | gpt-4o | Chat model. |
/// | BRIDGE_LLM_TIMEOUT_SECS | 60 | Transport timeout for a single AI call. |
/// | BRIDGE_HELPER_POOL_SIZE | 30 | Number of synthetic helpers seeded at startup. |
/// | BRIDGE_HELPER_POOL_SEED | unset | Optional seed for a reproducible pool. |
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub bind_addr: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub helper_pool_size: usize,
    pub helper_pool_seed: Option<u64>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            llm_api_key: None,
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            helper_pool_size: DEFAULT_HELPER_POOL_SIZE,
            helper_pool_seed: None,
        }
    }
}

impl BridgeConfig {
    /// Load from environment. Unset or invalid values => defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let opt = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            bind_addr: opt("BRIDGE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            llm_api_key: opt("OPENAI_API_KEY").or_else(|| opt("OPENROUTER_API_KEY")),
            llm_base_url: opt("BRIDGE_LLM_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.llm_base_url),
            llm_model: opt("BRIDGE_LLM_MODEL").unwrap_or(defaults.llm_model),
            llm_timeout_secs: opt("BRIDGE_LLM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.llm_timeout_secs),
            helper_pool_size: opt("BRIDGE_HELPER_POOL_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.helper_pool_size),
            helper_pool_seed: opt("BRIDGE_HELPER_POOL_SEED").and_then(|v| v.parse().ok()),
        }
    }

    /// True when AI-backed paths are attempted for this process.
    pub fn ai_enabled(&self) -> bool {
        self.llm_api_key.is_some()
    }
}
