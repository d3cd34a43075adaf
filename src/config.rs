//! Configuration for the RFP manager
//!
//! Values come from an optional TOML file layered under `RFP__*` environment
//! variables, e.g. `RFP__RECOMMENDATION__MODE=llm`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

const DEFAULT_CONFIG_FILE: &str = "config/rfp-manager";
const ENV_PREFIX: &str = "RFP";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub recommendation: RecommendationConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub mail: MailConfig,

    #[serde(default)]
    pub procurement: ProcurementConfig,
}

impl Config {
    /// Load from `config/rfp-manager.{toml,...}` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::build(None)
    }

    /// Load from an explicit file, still honouring environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::build(Some(path.as_ref()))
    }

    fn build(path: Option<&Path>) -> Result<Self> {
        // A missing .env is the normal case outside development
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Config>()?;

        Ok(config)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Which recommendation policy to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationMode {
    /// Deterministic highest-compliance rule
    Rules,
    /// Chat-completion model with the rules as fallback
    Llm,
}

/// Recommendation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default = "default_mode")]
    pub mode: RecommendationMode,

    /// Confidence reported by the rules policy, clamped to [0, 100]
    #[serde(default = "default_confidence")]
    pub confidence_score: f64,
}

fn default_mode() -> RecommendationMode {
    RecommendationMode::Rules
}

fn default_confidence() -> f64 {
    85.0
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            confidence_score: default_confidence(),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Chat completions endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key environment variable
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_llm_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_llm_timeout_ms() -> u64 {
    30_000
}

fn default_llm_max_retries() -> usize {
    3
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    1000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            timeout_ms: default_llm_timeout_ms(),
            max_retries: default_llm_max_retries(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_from_address")]
    pub from_address: String,

    /// Log outbound mail instead of handing it to a transport
    #[serde(default = "default_simulate")]
    pub simulate: bool,
}

fn default_from_address() -> String {
    "procurement@example.com".to_string()
}

fn default_simulate() -> bool {
    true
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_address: default_from_address(),
            simulate: default_simulate(),
        }
    }
}

/// Procurement defaults applied when a request leaves fields out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcurementConfig {
    #[serde(default = "default_delivery_days")]
    pub default_delivery_days: u32,

    /// Submission deadline offset for new RFPs
    #[serde(default = "default_deadline_days")]
    pub default_deadline_days: i64,

    /// Budget assumed when free text names no amount
    #[serde(default = "default_budget")]
    pub default_budget: f64,
}

fn default_delivery_days() -> u32 {
    30
}

fn default_deadline_days() -> i64 {
    14
}

fn default_budget() -> f64 {
    5000.0
}

impl Default for ProcurementConfig {
    fn default() -> Self {
        Self {
            default_delivery_days: default_delivery_days(),
            default_deadline_days: default_deadline_days(),
            default_budget: default_budget(),
        }
    }
}
