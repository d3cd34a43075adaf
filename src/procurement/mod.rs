//! Proposal scoring, comparison and vendor recommendation

pub mod aggregate;
pub mod comparison;
pub mod compliance;
pub mod llm_policy;
pub mod models;
pub mod recommend;

pub use aggregate::{ProposalRanges, DEFAULT_DELIVERY_DAYS};
pub use comparison::ComparisonManager;
pub use compliance::compliance_score;
pub use llm_policy::LlmPolicy;
pub use models::*;
pub use recommend::{
    no_recommendation, select_winner, RecommendationPolicy, RulesPolicy,
    DEFAULT_CONFIDENCE,
};

use std::sync::Arc;
use tracing::info;

use crate::config::{Config, RecommendationMode};
use crate::error::Result;

/// Construct the recommendation policy selected in `config`
pub fn build_policy(config: &Config) -> Result<Arc<dyn RecommendationPolicy>> {
    let rules = RulesPolicy::new(config.recommendation.confidence_score);

    let policy: Arc<dyn RecommendationPolicy> = match config.recommendation.mode {
        RecommendationMode::Rules => Arc::new(rules),
        RecommendationMode::Llm => Arc::new(LlmPolicy::new(config.llm.clone(), rules)?),
    };

    info!("Using {} recommendation policy", policy.name());
    Ok(policy)
}
